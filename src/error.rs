//! # Spatial Ingestor Errors
//!
//! Unified error type for job submission, callback handling, status polling
//! and cascade purges.

use serde_json::Value;
use thiserror::Error;

/// Crate result type
pub type Result<T> = std::result::Result<T, SpatialIngestorError>;

#[derive(Debug, Clone, Error)]
pub enum SpatialIngestorError {
    /// Required settings are absent or malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed caller input, rejected before any side effect
    #[error("Validation error: {0}")]
    Validation(String),

    /// Connection-level failure reaching the microservice
    #[error("Transport error: {message} ({details})")]
    Transport { message: String, details: String },

    /// Non-2xx response from the microservice
    #[error("Remote rejection: {status_code} - {message}")]
    RemoteRejection {
        status_code: u16,
        message: String,
        details: Value,
    },

    /// The microservice answered 2xx but the body is not what we expect
    #[error("Invalid response: {field} - {reason}")]
    InvalidResponse { field: String, reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Failure reported by the host catalog collaborator
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SpatialIngestorError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog(message.into())
    }

    /// True for the kinds the host surfaces to its caller as a validation failure
    #[must_use]
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Transport { .. }
                | Self::RemoteRejection { .. }
                | Self::InvalidResponse { .. }
        )
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for SpatialIngestorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
