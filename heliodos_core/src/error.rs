//! Error types for the overlay pipeline.
//!
//! Only construction-side mistakes are errors. Everything that can go missing
//! at render time (attitude, observer, camera, a sunrise) degrades to a
//! reduced overlay instead and never surfaces here.

use heliodos_env::EnvError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Path sampling needs both interval endpoints and a bounded buffer
    #[error("Sample count must be between 2 and 10000, got {0}")]
    InvalidSampleCount(usize),

    /// A configuration value is outside its usable range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Boundary validation failed (e.g. manual coordinates out of range)
    #[error(transparent)]
    Env(#[from] EnvError),

    /// Configuration JSON could not be parsed
    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be read
    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Creates an invalid-config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
