use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;

/// Request logging middleware.
///
/// Emits one structured `api_request` event per request with the route
/// template, concrete path, status, and latency. Session and gap ids only
/// appear in `path`; bodies are never logged.
pub async fn audit_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        tracing::warn!(
            method = %method,
            route = %route,
            path = %path,
            status,
            latency_ms,
            "api_request"
        );
    } else {
        tracing::info!(
            method = %method,
            route = %route,
            path = %path,
            status,
            latency_ms,
            "api_request"
        );
    }

    response
}
