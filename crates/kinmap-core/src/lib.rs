//! kinmap-core: Shared types, configuration, and error handling for kinmap.
//!
//! This crate provides the foundational types used across all kinmap components:
//! - Store-assigned identifiers for Person and Location nodes
//! - Read models (PersonView, Overview) assembled by the graph layer
//! - Input validation for names, places, and birth years
//! - Layered configuration loading
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use error::{KinmapError, ValidationError};
pub use types::{
    BirthYear, EntityPolicy, Linked, Location, LocationId, Overview, Person, PersonId, PersonView,
    DEFAULT_PERSON_LIMIT,
};
