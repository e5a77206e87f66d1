//! Error type shared by every solver entry point.
//!
//! Only malformed input and contract violations are errors. A search that
//! finds nothing, or stops at one of its caps, returns a normal result.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),
}

impl EngineError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        EngineError::InvalidInput(message.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
