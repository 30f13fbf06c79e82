use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::service::ShorteningService;

use super::handlers::{health_check, shorten_url, AppState};

pub fn create_api_router(shortener: Arc<ShorteningService>, public_base_url: String) -> Router {
    let state = Arc::new(AppState {
        shortener,
        public_base_url: public_base_url.trim_end_matches('/').to_string(),
    });

    Router::new()
        .route("/health", get(health_check))
        .route("/shorten", post(shorten_url))
        .with_state(state)
}
