//! Error types for the valuator service

use qacc_types::ValuationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValuatorError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] ::config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unknown project: {0}")]
    UnknownProject(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error(transparent)]
    Valuation(#[from] ValuationError),
}

impl From<serde_json::Error> for ValuatorError {
    fn from(err: serde_json::Error) -> Self {
        ValuatorError::SerializationError(err.to_string())
    }
}

impl From<toml::ser::Error> for ValuatorError {
    fn from(err: toml::ser::Error) -> Self {
        ValuatorError::SerializationError(err.to_string())
    }
}

/// Result type alias for service operations
pub type ValuatorResult<T> = Result<T, ValuatorError>;
