use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use notewell_gaps::response::ResolveGapRequest;
use notewell_gaps::service::{DismissOutcome, ResolveOutcome};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn resolve_gap(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ResolveGapRequest>,
) -> Result<Json<ResolveOutcome>, ApiError> {
    Ok(Json(state.service.resolve_gap(id, &request).await?))
}

pub async fn dismiss_gap(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DismissOutcome>, ApiError> {
    Ok(Json(state.service.dismiss_gap(id).await?))
}
