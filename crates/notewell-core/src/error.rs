use thiserror::Error;

use crate::models::session::SessionStatus;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error("invalid field config '{field_id}': {message}")]
    InvalidFieldConfig { field_id: String, message: String },
}
