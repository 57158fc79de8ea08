//! notewell-lambda
//!
//! HTTP surface of the gap engine, served through `lambda_http`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::Router;
use axum::middleware as axum_mw;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};

use state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/sessions/{id}/gaps/analyze", post(routes::sessions::analyze_gaps))
        .route("/sessions/{id}/gaps", get(routes::sessions::list_gaps))
        .route("/sessions/{id}/readiness", get(routes::sessions::readiness))
        .route(
            "/gaps/{id}",
            put(routes::gaps::resolve_gap).delete(routes::gaps::dismiss_gap),
        )
        .layer(axum_mw::from_fn(middleware::audit::audit_log))
        .layer(cors)
        .with_state(state)
}
