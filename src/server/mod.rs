//! HTTP server layer for MCP Link.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     cors (every response)                       │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │                 routes (exact-path table)                 │  │
//! │  │   /connect-api   /   /status   /health   │  fallback      │  │
//! │  │        handlers (local, GET only)        │  transport     │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cors;
pub mod handlers;
pub mod routes;

pub use cors::{apply_cors_headers, cors_middleware};
pub use handlers::{
    health_handler, status_handler, HealthEndpoints, HealthResponse, StatusResponse,
};
pub use routes::{create_router, RouterConfig, DOCS_PATH, HEALTH_PATH, ROOT_PATH, STATUS_PATH};
