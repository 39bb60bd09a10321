//! Route dispatch tests.
//!
//! Tests verify:
//! - Local routes answer GET with the documented payloads
//! - Other methods on local paths fall through to the transport
//! - Unknown paths reach the transport with method, URI and body intact

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, StatusCode};
use chrono::{DateTime, Utc};
use tower::ServiceExt;

use mcp_link::{create_router, RouterConfig, SseTransport};

use super::test_utils::{body_bytes, body_json, request, router_with, RecordingTransport};

// =============================================================================
// Local Routes
// =============================================================================

#[tokio::test]
async fn test_docs_page_served() {
    let transport = Arc::new(RecordingTransport::new());
    let router = router_with(Arc::clone(&transport));

    let response = router
        .oneshot(request(Method::GET, "/connect-api"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/html"));

    let body = body_bytes(response).await;
    assert!(String::from_utf8(body).unwrap().contains("<html"));
    assert_eq!(transport.handled(), 0);
}

#[tokio::test]
async fn test_missing_docs_page_is_not_found() {
    let transport = Arc::new(RecordingTransport::new());
    let router = create_router(
        transport,
        RouterConfig::new()
            .with_docs_page("/nonexistent/connect-api.html")
            .with_tracing(false),
    );

    let response = router
        .oneshot(request(Method::GET, "/connect-api"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_root_returns_health_payload() {
    let transport = Arc::new(RecordingTransport::new());
    let router = router_with(Arc::clone(&transport));

    let response = router.oneshot(request(Method::GET, "/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "MCP Link Server");
    assert_eq!(json["version"], "1.0.0");
    assert_eq!(json["endpoints"]["sse"], "/sse");
    assert_eq!(json["endpoints"]["message"], "/message");
    assert_eq!(json["endpoints"]["connect-api"], "/connect-api");
    assert!(json["description"].is_string());
    assert_eq!(transport.handled(), 0);
}

#[tokio::test]
async fn test_status_aliases_return_fresh_timestamp() {
    let transport = Arc::new(RecordingTransport::new());
    let router = router_with(Arc::clone(&transport));

    for path in ["/status", "/health"] {
        let before = Utc::now();
        let response = router
            .clone()
            .oneshot(request(Method::GET, path))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "path {}", path);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");

        let timestamp = json["timestamp"].as_str().unwrap();
        let parsed = DateTime::parse_from_rfc3339(timestamp).unwrap();
        let drift = (parsed.with_timezone(&Utc) - before).num_seconds().abs();
        assert!(drift <= 2, "{} timestamp drifted {}s", path, drift);

        // Only the two documented fields
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    assert_eq!(transport.handled(), 0);
}

// =============================================================================
// Forwarding
// =============================================================================

#[tokio::test]
async fn test_post_sse_reaches_transport_unchanged() {
    let transport = Arc::new(RecordingTransport::new());
    let router = router_with(Arc::clone(&transport));

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/sse")
        .body(Body::from(r#"{"hello":"world"}"#))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["transport"], true);
    assert_eq!(json["method"], "POST");
    assert_eq!(json["uri"], "/sse");
    assert_eq!(json["body"], r#"{"hello":"world"}"#);
    assert_eq!(transport.handled(), 1);
}

#[tokio::test]
async fn test_query_string_preserved() {
    let transport = Arc::new(RecordingTransport::new());
    let router = router_with(Arc::clone(&transport));

    let response = router
        .oneshot(request(Method::POST, "/message?sessionId=abc-123"))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["uri"], "/message?sessionId=abc-123");
}

#[tokio::test]
async fn test_non_get_on_local_paths_falls_through() {
    let cases = [
        (Method::POST, "/"),
        (Method::PUT, "/connect-api"),
        (Method::DELETE, "/status"),
        (Method::PATCH, "/health"),
    ];

    for (method, path) in cases {
        let transport = Arc::new(RecordingTransport::new());
        let router = router_with(Arc::clone(&transport));

        let response = router
            .oneshot(request(method.clone(), path))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{} {}", method, path);
        let json = body_json(response).await;
        assert_eq!(json["transport"], true, "{} {}", method, path);
        assert_eq!(json["method"], method.as_str());
        assert_eq!(json["uri"], path);
        assert_eq!(transport.handled(), 1);
    }
}

#[tokio::test]
async fn test_head_on_local_paths_falls_through() {
    for path in ["/", "/connect-api", "/status", "/health"] {
        let transport = Arc::new(RecordingTransport::new());
        let router = router_with(Arc::clone(&transport));

        let response = router
            .oneshot(request(Method::HEAD, path))
            .await
            .unwrap();

        // HEAD bodies are stripped, so count transport calls instead.
        assert_eq!(response.status(), StatusCode::OK, "HEAD {}", path);
        assert_eq!(transport.handled(), 1, "HEAD {}", path);
    }
}

#[tokio::test]
async fn test_paths_match_exactly() {
    for path in ["/status/", "/healthz", "/connect-api/extra", "/unknown"] {
        let transport = Arc::new(RecordingTransport::new());
        let router = router_with(Arc::clone(&transport));

        let response = router.oneshot(request(Method::GET, path)).await.unwrap();

        let json = body_json(response).await;
        assert_eq!(json["transport"], true, "path {}", path);
        assert_eq!(json["uri"], path);
    }
}

#[tokio::test]
async fn test_sse_transport_owns_not_found() {
    let router = router_with(Arc::new(SseTransport::new()));

    let response = router
        .oneshot(request(Method::GET, "/does-not-exist"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_sse_stream_through_router() {
    let transport = Arc::new(SseTransport::new());
    let router = router_with(Arc::clone(&transport));

    let response = router.oneshot(request(Method::GET, "/sse")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/event-stream"
    );
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
    assert_eq!(transport.open_streams(), 1);
}
