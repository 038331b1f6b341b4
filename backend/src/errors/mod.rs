//! Global application error types and handlers.
//!
//! This module defines custom error types that are used across the entire
//! backend application and provides mechanisms for consistent error handling
//! and response formatting.

use thiserror::Error;

/// Represents errors that can occur during the OAuth device-code lifecycle.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Required endpoint or resource configuration is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// No valid credential exists; the caller must run the login flow.
    #[error("Not authenticated")]
    NotAuthenticated,
    /// The refresh round trip failed. The stored credential has been cleared.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
    /// Any other non-2xx or malformed response from the identity provider.
    #[error("Identity provider error: {0}")]
    Upstream(String),
    /// The credential store could not be read or written.
    #[error("Credential store error: {source}")]
    Store {
        #[from]
        source: anyhow::Error,
    },
}

/// Generic service error that can be used across all entities
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("External service error: {message}")]
    ExternalService { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    // Helper constructors for common patterns

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    pub fn external_service(message: impl Into<String>) -> Self {
        Self::ExternalService {
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::NotAuthenticated | AuthError::RefreshFailed(_) => {
                ServiceError::unauthorized(error.to_string())
            }
            AuthError::Configuration(message) => ServiceError::internal_error(message),
            AuthError::Upstream(message) => ServiceError::external_service(message),
            AuthError::Store { source } => ServiceError::internal_error(source.to_string()),
        }
    }
}
