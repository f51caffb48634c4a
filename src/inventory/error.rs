use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("authentication rejected (HTTP {status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("request failed (HTTP {status}): {body}")]
    Request { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response payload: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, InventoryError>;
