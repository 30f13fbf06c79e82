use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::service::ResolutionService;

pub struct RedirectState {
    pub resolver: Arc<ResolutionService>,
}

/// Redirect to original URL
pub async fn redirect_url(
    State(state): State<Arc<RedirectState>>,
    Path(code): Path<String>,
) -> Response {
    let original_url = match state.resolver.resolve(&code).await {
        Ok(url) => url,
        Err(_) => return (StatusCode::NOT_FOUND, "URL not found").into_response(),
    };

    // 302 Found; axum's `Redirect` only offers 303, 307 and 308
    match HeaderValue::try_from(original_url) {
        Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        Err(err) => {
            tracing::error!(short_code = %code, error = %err, "Stored URL is not a valid Location header");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
