use std::sync::Arc;

use notewell_gaps::GapService;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GapService>,
}

impl AppState {
    pub fn new(service: GapService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
