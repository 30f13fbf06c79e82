//! Composition of the HTTP surface
//!
//! Shortening, health and redirect routes are served from one router, wrapped
//! in access logging, permissive CORS, a per-request timeout and, when
//! configured, per-client rate limiting.

pub mod rate_limit;

use axum::http::StatusCode;
use axum::{middleware, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::api::create_api_router;
use crate::redirect::create_redirect_router;
use crate::service::{ResolutionService, ShorteningService};

pub use self::rate_limit::RateLimiter;

pub struct AppOptions {
    pub public_base_url: String,
    pub request_timeout: Duration,
    pub rate_limiter: Option<Arc<RateLimiter>>,
}

pub fn build_router(
    shortener: Arc<ShorteningService>,
    resolver: Arc<ResolutionService>,
    options: AppOptions,
) -> Router {
    let mut router = create_api_router(shortener, options.public_base_url)
        .merge(create_redirect_router(resolver));

    if let Some(limiter) = options.rate_limiter {
        router = router.layer(middleware::from_fn_with_state(
            limiter,
            rate_limit::rate_limit,
        ));
    }

    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            options.request_timeout,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
