//! HTTP handlers for the locally served routes.
//!
//! # Endpoints
//!
//! - `GET /` - Service description and health
//! - `GET /status`, `GET /health` - Liveness with a fresh UTC timestamp

use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::routes::DOCS_PATH;
use crate::transport::{MESSAGE_PATH, SSE_PATH};

/// Service name reported by the root route.
pub const SERVICE_NAME: &str = "MCP Link Server";

/// Version string reported by the root route.
pub const SERVICE_VERSION: &str = "1.0.0";

/// One-line description reported by the root route.
pub const SERVICE_DESCRIPTION: &str = "Convert Any OpenAPI V3 API to MCP Server";

// =============================================================================
// Response Types
// =============================================================================

/// Root route response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy"
    pub status: &'static str,

    /// Service name
    pub service: &'static str,

    /// Service version
    pub version: &'static str,

    /// Named sub-endpoints
    pub endpoints: HealthEndpoints,

    pub description: &'static str,
}

/// Sub-endpoints advertised by the root route.
#[derive(Debug, Serialize)]
pub struct HealthEndpoints {
    pub sse: &'static str,
    pub message: &'static str,
    #[serde(rename = "connect-api")]
    pub connect_api: &'static str,
}

/// Status route response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Always "ok"
    pub status: &'static str,

    /// Current time, RFC 3339 in UTC
    pub timestamp: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Describe the service.
///
/// # Endpoint
///
/// `GET /`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "service": "MCP Link Server",
///   "version": "1.0.0",
///   "endpoints": { "sse": "/sse", "message": "/message", "connect-api": "/connect-api" },
///   "description": "Convert Any OpenAPI V3 API to MCP Server"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: SERVICE_VERSION,
        endpoints: HealthEndpoints {
            sse: SSE_PATH,
            message: MESSAGE_PATH,
            connect_api: DOCS_PATH,
        },
        description: SERVICE_DESCRIPTION,
    })
}

/// Report liveness.
///
/// # Endpoint
///
/// `GET /status` or `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body `{"status": "ok", "timestamp": "2024-01-01T00:00:00Z"}`.
/// The timestamp is computed per request.
pub async fn status_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}

// =============================================================================
// Tests
// =============================================================================
