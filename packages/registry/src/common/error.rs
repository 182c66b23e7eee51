use thiserror::Error;
use tracing::error;

use super::auth::AuthError;
use super::validation::ValidationErrors;

/// The single error type returned by every registry operation.
///
/// Display strings are safe to hand to callers. `Internal` keeps the full
/// cause chain as its `source()` but displays only "internal error".
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unauthorized")]
    Unauthenticated,

    #[error("forbidden")]
    Forbidden,

    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl RegistryError {
    pub fn not_found(entity: &'static str) -> Self {
        RegistryError::NotFound { entity }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        RegistryError::Conflict(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        RegistryError::Validation(ValidationErrors::single(field, message))
    }

    /// HTTP-style status code for transports built on top of the registry.
    pub fn status_code(&self) -> u16 {
        match self {
            RegistryError::Unauthenticated => 401,
            RegistryError::Forbidden => 403,
            RegistryError::Validation(_) => 422,
            RegistryError::NotFound { .. } => 404,
            RegistryError::Conflict(_) => 409,
            RegistryError::Internal(_) => 500,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, RegistryError::Validation(_))
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            RegistryError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<AuthError> for RegistryError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated => RegistryError::Unauthenticated,
            AuthError::Forbidden => RegistryError::Forbidden,
        }
    }
}

impl From<ValidationErrors> for RegistryError {
    fn from(errors: ValidationErrors) -> Self {
        RegistryError::Validation(errors)
    }
}

impl From<anyhow::Error> for RegistryError {
    fn from(err: anyhow::Error) -> Self {
        error!(error = ?err, "internal failure");
        RegistryError::Internal(err)
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
