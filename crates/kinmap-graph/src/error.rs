//! Error types for the kinmap-graph crate.

use thiserror::Error;

use kinmap_core::{LocationId, PersonId, ValidationError};

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("{label} not found: {key}")]
    NotFound { label: &'static str, key: String },

    #[error("{label} {key} is ambiguous: {count} nodes match")]
    AmbiguousMatch {
        label: &'static str,
        key: String,
        count: usize,
    },

    #[error("Person {person} is already born in location {existing}")]
    BirthplaceConflict {
        person: PersonId,
        existing: LocationId,
    },

    #[error("Invalid input: {0}")]
    Invalid(#[from] ValidationError),
}

impl GraphError {
    pub(crate) fn not_found(label: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            label,
            key: key.to_string(),
        }
    }

    /// True for errors caused by what the caller asked for rather than by the store.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
