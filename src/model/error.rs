use thiserror::Error;

/// Malformed operator input or remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    MissingField { field: &'static str },

    #[error("{field} contains a blank entry at position {index}")]
    BlankEntry { field: &'static str, index: usize },

    #[error("{field} contains duplicate entry '{value}'")]
    DuplicateEntry { field: &'static str, value: String },

    #[error("'{0}' is not a valid hostname")]
    InvalidHostname(String),

    #[error("php runtime requires instance type 'php', got '{0}'")]
    RuntimeMismatch(String),
}
