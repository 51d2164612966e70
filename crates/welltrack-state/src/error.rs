//! Error types for the welltrack store.

use thiserror::Error;

/// Result type alias for store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during store operations.
///
/// The storage variants carry the message of the underlying redb or serde
/// failure. `NotFound`, `Conflict` and `InvalidInput` are domain outcomes the
/// API layer surfaces to callers as rejected requests.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl StateError {
    /// True for the not-found outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True when the request was rejected rather than failing in storage.
    pub fn is_rejected_input(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::InvalidInput(_))
    }

    pub(crate) fn well_not_found(name: &str) -> Self {
        Self::NotFound(format!("well with name '{name}' not found"))
    }

    pub(crate) fn channel_not_found(well_name: &str, channel_name: &str) -> Self {
        Self::NotFound(format!(
            "channel with name '{channel_name}' not found for well '{well_name}'"
        ))
    }
}
