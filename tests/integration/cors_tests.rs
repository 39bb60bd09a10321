//! CORS policy tests.
//!
//! Tests verify:
//! - Preflight requests get an empty 200 on any path without reaching a handler
//! - Local and forwarded responses both carry the permissive headers

use std::sync::Arc;

use axum::http::{HeaderMap, Method, StatusCode};
use tower::ServiceExt;

use super::test_utils::{body_bytes, request, router_with, RecordingTransport};

fn assert_cors(headers: &HeaderMap) {
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    assert_eq!(headers.get("access-control-allow-methods").unwrap(), "*");
    assert_eq!(headers.get("access-control-allow-headers").unwrap(), "*");
}

#[tokio::test]
async fn test_preflight_on_any_path() {
    for path in ["/", "/connect-api", "/status", "/health", "/sse", "/message", "/anything/else"] {
        let transport = Arc::new(RecordingTransport::new());
        let router = router_with(Arc::clone(&transport));

        let response = router
            .oneshot(request(Method::OPTIONS, path))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "path {}", path);
        assert_cors(response.headers());
        assert!(body_bytes(response).await.is_empty(), "path {}", path);
        assert_eq!(transport.handled(), 0, "path {}", path);
    }
}

#[tokio::test]
async fn test_local_routes_carry_cors_headers() {
    let router = router_with(Arc::new(RecordingTransport::new()));

    for path in ["/", "/status", "/health", "/connect-api"] {
        let response = router
            .clone()
            .oneshot(request(Method::GET, path))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "path {}", path);
        assert_cors(response.headers());
    }
}

#[tokio::test]
async fn test_forwarded_responses_carry_cors_headers() {
    let transport = Arc::new(RecordingTransport::new());
    let router = router_with(Arc::clone(&transport));

    let response = router
        .oneshot(request(Method::POST, "/message"))
        .await
        .unwrap();

    assert_eq!(transport.handled(), 1);
    assert_cors(response.headers());
}
