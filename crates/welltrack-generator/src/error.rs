//! Generator error types.

use thiserror::Error;

/// Errors that can occur while generating synthetic data.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("invalid time range: {0}")]
    InvalidRange(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("state store error: {0}")]
    State(#[from] welltrack_state::StateError),
}

impl GeneratorError {
    /// True when the request was rejected before anything was written.
    pub fn is_rejected_input(&self) -> bool {
        match self {
            Self::InvalidRange(_) | Self::InvalidParameter(_) => true,
            Self::State(err) => err.is_rejected_input(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::State(err) if err.is_not_found())
    }
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;
