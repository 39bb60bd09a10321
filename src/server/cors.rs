//! Cross-origin policy.
//!
//! Every response, local or forwarded, allows any origin, method and header.
//! Preflight (`OPTIONS`) requests are answered here with an empty `200` and
//! never reach the router's handlers or the streaming transport.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};

/// Insert the permissive CORS headers into `headers`.
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    let any = HeaderValue::from_static("*");
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, any.clone());
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, any.clone());
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, any);
}

/// Axum middleware applying the unrestricted CORS policy.
///
/// Use with `axum::middleware::from_fn`.
pub async fn cors_middleware(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    apply_cors_headers(response.headers_mut());
    response
}
