//! API integration tests
//!
//! These drive the full router with `oneshot` requests: shortening, health
//! checks and the JSON error contract.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use shortener::app::{build_router, AppOptions};
use shortener::cache::MemoryCache;
use shortener::encoding;
use shortener::service::{ClickAccountant, DuplicatePolicy, ResolutionService, ShorteningService};
use shortener::storage::{SqliteStorage, Storage};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const BASE_URL: &str = "https://sho.rt";

/// Helper to create test storage
async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 5).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

fn create_test_app(storage: Arc<dyn Storage>, duplicate_policy: DuplicatePolicy) -> Router {
    let clicks = ClickAccountant::new(Arc::clone(&storage), Duration::from_secs(5));
    let shortener = Arc::new(ShorteningService::new(Arc::clone(&storage), duplicate_policy));
    let resolver = Arc::new(ResolutionService::new(
        storage,
        Arc::new(MemoryCache::new(100)),
        clicks,
        Duration::from_secs(60),
    ));

    build_router(
        shortener,
        resolver,
        AppOptions {
            public_base_url: format!("{BASE_URL}/"),
            request_timeout: Duration::from_secs(10),
            rate_limiter: None,
        },
    )
}

fn shorten_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/shorten")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_shorten_returns_code_and_short_url() {
    let storage = create_test_storage().await;
    let app = create_test_app(Arc::clone(&storage), DuplicatePolicy::AlwaysCreate);

    let response = app
        .oneshot(shorten_request(r#"{"url": "https://example.com/landing"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let code = body["short_code"].as_str().unwrap();

    assert_eq!(body["short_url"], format!("{BASE_URL}/{code}"));

    let id = encoding::decode(code).unwrap() as i64;
    let stored = storage.get_by_code(code).await.unwrap().unwrap();
    assert_eq!(stored.id, id);
    assert_eq!(stored.original_url, "https://example.com/landing");
}

#[tokio::test]
async fn test_shorten_defaults_to_https() {
    let storage = create_test_storage().await;
    let app = create_test_app(Arc::clone(&storage), DuplicatePolicy::AlwaysCreate);

    let response = app
        .oneshot(shorten_request(r#"{"url": "  example.com/no-scheme "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let code = body["short_code"].as_str().unwrap();

    let stored = storage.get_by_code(code).await.unwrap().unwrap();
    assert_eq!(stored.original_url, "https://example.com/no-scheme");
}

#[tokio::test]
async fn test_shorten_error_contract() {
    let storage = create_test_storage().await;
    let app = create_test_app(storage, DuplicatePolicy::AlwaysCreate);

    let cases = [
        ("{not json", "invalid JSON"),
        (r#"{"url": ""}"#, "URL is required"),
        (r#"{"url": "   "}"#, "URL is required"),
        ("{}", "URL is required"),
    ];

    for (body, expected) in cases {
        let response = app.clone().oneshot(shorten_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(json_body(response).await["error"], expected, "body: {body}");
    }

    let response = app
        .oneshot(shorten_request(r#"{"url": "http://"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json_body(response).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("invalid URL: "), "unexpected error: {error}");
}

#[tokio::test]
async fn test_duplicate_policy_through_api() {
    let storage = create_test_storage().await;
    let app = create_test_app(storage, DuplicatePolicy::ReuseExisting);

    let mut codes = vec![];
    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(shorten_request(r#"{"url": "https://example.com/again"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        codes.push(json_body(response).await["short_code"].as_str().unwrap().to_string());
    }

    assert!(codes.iter().all(|c| c == &codes[0]));
}

#[tokio::test]
async fn test_concurrent_shortening_yields_unique_codes() {
    let storage = create_test_storage().await;
    let app = create_test_app(storage, DuplicatePolicy::AlwaysCreate);

    let mut handles = vec![];
    for i in 0..10 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let body = format!(r#"{{"url": "https://example.com/{i}"}}"#);
            app.oneshot(shorten_request(&body)).await.unwrap()
        }));
    }

    let mut codes = vec![];
    for handle in handles {
        let response = handle.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        codes.push(json_body(response).await["short_code"].as_str().unwrap().to_string());
    }

    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), 10, "Every shortened URL should get its own code");
}

#[tokio::test]
async fn test_health_check() {
    let storage = create_test_storage().await;
    let app = create_test_app(storage, DuplicatePolicy::AlwaysCreate);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "OK");
}
