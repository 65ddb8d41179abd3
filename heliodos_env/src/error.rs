//! Error types for the Heliodos environment boundary.

use thiserror::Error;

/// Errors raised when validating values that cross the environment boundary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnvError {
    /// Observer coordinates outside their valid range (or not finite)
    #[error("Invalid observer: {0}")]
    InvalidObserver(String),
}

impl EnvError {
    /// Creates an invalid-observer error.
    pub fn invalid_observer(msg: impl Into<String>) -> Self {
        Self::InvalidObserver(msg.into())
    }
}
