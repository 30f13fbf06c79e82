use axum::{routing::get, Router};
use std::sync::Arc;

use crate::service::ResolutionService;

use super::handlers::{redirect_url, RedirectState};

pub fn create_redirect_router(resolver: Arc<ResolutionService>) -> Router {
    let state = Arc::new(RedirectState { resolver });

    Router::new()
        .route("/{code}", get(redirect_url))
        .with_state(state)
}
