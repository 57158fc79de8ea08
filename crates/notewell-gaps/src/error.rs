use thiserror::Error;

use notewell_core::error::CoreError;
use notewell_storage::error::StorageError;

/// Failure of one detection run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    #[error("session has no mapped content; run content mapping first")]
    NoContent,

    #[error("invalid detection input: {0}")]
    InvalidInput(String),

    #[error("internal detection error: {0}")]
    Internal(String),
}

/// A rejected gap response. `field` names the offending form field, if any.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: Option<String>,
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("session has no mapped content; run content mapping first")]
    NoContent,

    #[error("concurrent update conflict: {0}")]
    Conflict(String),

    #[error("note generation failed: {0}")]
    Generation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<DetectionError> for ServiceError {
    fn from(e: DetectionError) -> Self {
        match e {
            DetectionError::NoContent => ServiceError::NoContent,
            DetectionError::InvalidInput(msg) => {
                ServiceError::Validation(ValidationError::new(msg))
            }
            DetectionError::Internal(msg) => ServiceError::Internal(msg),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            StorageError::PreconditionFailed { key } => ServiceError::Conflict(key),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(e: CoreError) -> Self {
        ServiceError::Validation(ValidationError::new(e.to_string()))
    }
}
