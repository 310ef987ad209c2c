use thiserror::Error;

/// Rejected input, detected before anything reaches the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("Invalid birth year {value:?}: {reason}")]
    InvalidYear { value: String, reason: String },

    #[error("A person cannot be friends with themself: {name}")]
    SelfFriendship { name: String },
}

/// Top-level error type for kinmap settings and startup.
#[derive(Error, Debug)]
pub enum KinmapError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
