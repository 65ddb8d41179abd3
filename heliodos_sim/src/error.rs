//! Error types for the simulation harness.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Invalid simulation configuration: {0}")]
    InvalidConfig(String),

    #[error("Live task '{0}' panicked")]
    TaskPanicked(&'static str),

    #[error(transparent)]
    Env(#[from] heliodos_env::EnvError),

    #[error(transparent)]
    Core(#[from] heliodos_core::CoreError),
}
