//! Core domain types for the kinmap people graph.
//!
//! Nodes carry store-assigned numeric identities; these types never mint ids
//! themselves, they only wrap what the store hands back.

use std::fmt;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default number of people returned by an overview listing.
pub const DEFAULT_PERSON_LIMIT: u32 = 15;

/// Earliest birth year accepted by [`BirthYear::new`].
pub const MIN_BIRTH_YEAR: i64 = 1;

// ── Identifiers ───────────────────────────────────────────────────

/// Store-assigned identity of a Person node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct PersonId(pub i64);

/// Store-assigned identity of a Location node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct LocationId(pub i64);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ── Nodes ─────────────────────────────────────────────────────────

/// A person as it appears in listings and friend lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
}

/// A place someone can be born in, keyed by `(city, state)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub id: LocationId,
    pub city: String,
    pub state: String,
}

/// Year attribute of a BORN_IN edge.
///
/// Always stored as an integer so that a repeated connect matches the
/// existing edge instead of creating a second one with a string year.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct BirthYear(i64);

impl BirthYear {
    /// Validate a numeric year: between [`MIN_BIRTH_YEAR`] and the current year.
    pub fn new(year: i64) -> Result<Self, ValidationError> {
        let current = i64::from(Utc::now().year());
        if year < MIN_BIRTH_YEAR {
            return Err(ValidationError::InvalidYear {
                value: year.to_string(),
                reason: format!("must be at least {MIN_BIRTH_YEAR}"),
            });
        }
        if year > current {
            return Err(ValidationError::InvalidYear {
                value: year.to_string(),
                reason: format!("must not be after {current}"),
            });
        }
        Ok(Self(year))
    }

    /// Parse a year from free-form input such as a form field or CLI argument.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let year = trimmed
            .parse::<i64>()
            .map_err(|e| ValidationError::InvalidYear {
                value: raw.to_string(),
                reason: e.to_string(),
            })?;
        Self::new(year)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for BirthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ── Policies & outcomes ───────────────────────────────────────────

/// How `add_person` / `add_location` treat an existing node with the same key.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntityPolicy {
    /// Names (and `(city, state)` pairs) are unique keys: adding twice
    /// returns the existing node.
    #[default]
    MergeOnName,
    /// Every add creates a fresh node, even when the key already exists.
    AlwaysInsert,
}

/// Outcome of a connect operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Linked {
    Created,
    Existing,
}

// ── Read models ───────────────────────────────────────────────────

/// A person's identity, birthplace, and friends, assembled from three traversals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonView {
    pub id: PersonId,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    /// Year recorded on the BORN_IN edge.
    pub year: Option<i64>,
    /// Distinct friends in either edge direction, ordered by id.
    pub friends: Vec<Person>,
}

/// Home-page read model: a bounded page of people plus every location.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Overview {
    pub persons: Vec<Person>,
    pub locations: Vec<Location>,
}

// ── Validation helpers ────────────────────────────────────────────

/// Trim `value`, rejecting it if nothing is left.
pub fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed.to_string())
}
