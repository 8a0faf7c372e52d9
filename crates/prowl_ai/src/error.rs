//! Error types for behavior setup

use prowl_nav::NavError;
use thiserror::Error;

/// Errors raised while loading or validating an agent configuration
#[derive(Debug, Error)]
pub enum AiError {
    #[error(transparent)]
    Nav(#[from] NavError),

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid behavior configuration
    #[error("Invalid behavior configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for behavior setup
pub type Result<T> = std::result::Result<T, AiError>;
