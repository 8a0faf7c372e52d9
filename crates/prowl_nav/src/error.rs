//! Error types for the navigation core

use thiserror::Error;

/// Navigation configuration errors
///
/// Per-tick queries never fail; these only surface when a configuration is
/// validated before use.
#[derive(Debug, Error)]
pub enum NavError {
    /// Invalid configuration
    #[error("Invalid navigation configuration: {0}")]
    InvalidConfig(String),

    /// Room layout that cannot contain the agent
    #[error("Invalid room layout: {0}")]
    InvalidLayout(String),
}

/// Result type for navigation setup
pub type Result<T> = std::result::Result<T, NavError>;
