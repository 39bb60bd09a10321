//! Router configuration for MCP Link.
//!
//! # Route Structure
//!
//! ```text
//! GET  /connect-api        - Connection documentation page (static file)
//! GET  /                   - Service description (JSON)
//! GET  /status, /health    - Liveness with timestamp (JSON)
//! *    anything else       - Forwarded unchanged to the streaming transport
//! ```
//!
//! Local routes only answer `GET`. Other methods on those paths, `HEAD`
//! included, fall through to the transport, which owns the not-found contract. The CORS middleware
//! wraps every route, including the transport fallback.

use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, get_service};
use axum::{middleware, Router};
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

use super::cors::cors_middleware;
use super::handlers::{health_handler, status_handler};
use crate::config::DEFAULT_DOCS_PAGE;
use crate::transport::{StreamingTransport, TransportService};

/// Documentation page route.
pub const DOCS_PATH: &str = "/connect-api";

/// Service description route.
pub const ROOT_PATH: &str = "/";

/// Status route.
pub const STATUS_PATH: &str = "/status";

/// Alias of [`STATUS_PATH`].
pub const HEALTH_PATH: &str = "/health";

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// File served at `/connect-api`
    pub docs_page: PathBuf,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a configuration serving the default documentation page.
    pub fn new() -> Self {
        Self {
            docs_page: PathBuf::from(DEFAULT_DOCS_PAGE),
            enable_tracing: true,
        }
    }

    /// Set the file served at `/connect-api`.
    pub fn with_docs_page(mut self, path: impl Into<PathBuf>) -> Self {
        self.docs_page = path.into();
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Local routes are matched on exact paths; everything else, including
/// non-GET requests to local paths, goes to `transport` untouched. axum
/// answers `HEAD` from a `GET` route unless told otherwise, so `HEAD` is
/// forwarded explicitly.
pub fn create_router<T: StreamingTransport>(transport: Arc<T>, config: RouterConfig) -> Router {
    let forward = TransportService::new(transport);

    let router = Router::new()
        .route(
            DOCS_PATH,
            get_service(ServeFile::new(&config.docs_page))
                .head_service(forward.clone())
                .fallback_service(forward.clone()),
        )
        .route(
            ROOT_PATH,
            get(health_handler)
                .head_service(forward.clone())
                .fallback_service(forward.clone()),
        )
        .route(
            STATUS_PATH,
            get(status_handler)
                .head_service(forward.clone())
                .fallback_service(forward.clone()),
        )
        .route(
            HEALTH_PATH,
            get(status_handler)
                .head_service(forward.clone())
                .fallback_service(forward.clone()),
        )
        .fallback_service(forward)
        .layer(middleware::from_fn(cors_middleware));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

// =============================================================================
// Tests
// =============================================================================
