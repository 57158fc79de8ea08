use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use notewell_gaps::error::ServiceError;

/// Unified API error type for all route handlers.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest {
        message: String,
        field: Option<String>,
    },
    Conflict(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            field: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message safe to show a caller. Internal details are logged here
    /// and replaced with a generic message.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::NotFound(msg) | ApiError::Conflict(msg) => msg.clone(),
            ApiError::BadRequest { message, .. } => message.clone(),
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                "internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.public_message();
        let field = match self {
            ApiError::BadRequest { field, .. } => field,
            _ => None,
        };

        (status, Json(ErrorBody { error, field })).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(v) => ApiError::BadRequest {
                message: v.message,
                field: v.field,
            },
            ServiceError::NoContent => ApiError::bad_request(e.to_string()),
            ServiceError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ServiceError::Conflict(key) => ApiError::Conflict(format!(
                "{key} was modified concurrently; retry the request"
            )),
            ServiceError::Generation(_) | ServiceError::Internal(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}
