use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

use crate::models::{ShortenRequest, ShortenResponse};
use crate::service::{ServiceError, ShorteningService};

pub struct AppState {
    pub shortener: Arc<ShorteningService>,
    /// Base for building `short_url`, without a trailing slash
    pub public_base_url: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Prepend `https://` to input that names no http(s) scheme
fn with_default_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Shorten a URL
pub async fn shorten_url(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(error = %rejection, "Rejected shorten request body");
        api_error(StatusCode::BAD_REQUEST, "invalid JSON")
    })?;

    let raw_url = request.url.trim();
    if raw_url.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "URL is required"));
    }

    match state.shortener.shorten(&with_default_scheme(raw_url)).await {
        Ok(mapping) => Ok(Json(ShortenResponse {
            short_url: format!("{}/{}", state.public_base_url, mapping.short_code),
            short_code: mapping.short_code,
        })),
        Err(err @ ServiceError::InvalidInput(_)) => {
            Err(api_error(StatusCode::BAD_REQUEST, err.to_string()))
        }
        Err(err) => {
            error!(error = %err, "Failed to shorten URL");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to shorten URL",
            ))
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
