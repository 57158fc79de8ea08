use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use uuid::Uuid;

use notewell_gaps::DetectionOverrides;
use notewell_gaps::detect::DetectionResponse;
use notewell_gaps::service::{GapListing, GapQuery, Readiness};

use crate::error::ApiError;
use crate::state::AppState;

/// Run gap detection for a session and persist the result.
///
/// Always answers with the detection envelope; failures carry
/// `success: false` and the precondition that failed, with a matching
/// HTTP status. An empty body means no overrides.
pub async fn analyze_gaps(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> (StatusCode, Json<DetectionResponse>) {
    let overrides = if body.iter().all(u8::is_ascii_whitespace) {
        DetectionOverrides::default()
    } else {
        match serde_json::from_slice::<DetectionOverrides>(&body) {
            Ok(overrides) => overrides,
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "rejected analyze overrides");
                return failure(ApiError::bad_request(format!("invalid overrides: {e}")));
            }
        }
    };

    match state.service.analyze_gaps(id, &overrides).await {
        Ok(result) => (StatusCode::OK, Json(DetectionResponse::from(Ok(result)))),
        Err(e) => failure(ApiError::from(e)),
    }
}

fn failure(err: ApiError) -> (StatusCode, Json<DetectionResponse>) {
    let response = DetectionResponse {
        success: false,
        error: Some(err.public_message()),
        result: None,
    };
    (err.status(), Json(response))
}

pub async fn list_gaps(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<GapQuery>,
) -> Result<Json<GapListing>, ApiError> {
    Ok(Json(state.service.list_gaps(id, &query).await?))
}

pub async fn readiness(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Readiness>, ApiError> {
    Ok(Json(state.service.readiness(id).await?))
}
