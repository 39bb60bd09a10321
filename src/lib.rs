//! # MCP Link
//!
//! An HTTP front door for MCP (Model Context Protocol) servers.
//!
//! This library exposes a Server-Sent-Events streaming transport next to a
//! few auxiliary routes, and coordinates an orderly shutdown in which open
//! streaming sessions are drained before the HTTP listener closes.
//!
//! ## Architecture
//!
//! - [`server`] - Axum router: CORS policy, local routes, transport fallback
//! - [`transport`] - The [`StreamingTransport`] seam and the built-in SSE transport
//! - [`lifecycle`] - Listener startup, signal handling and two-phase shutdown
//! - [`config`] - CLI and configuration types
//! - [`error`] - Fatal server and transport errors
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mcp_link::{shutdown_signal, Lifecycle, RouterConfig, SseTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mcp_link::ServerError> {
//!     let transport = Arc::new(SseTransport::new());
//!     let mut lifecycle = Lifecycle::bind("0.0.0.0:8080", transport, RouterConfig::new()).await?;
//!     lifecycle.run(shutdown_signal()).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod server;
pub mod transport;

// Re-export commonly used types
pub use config::{resolve_port, Cli, Command, ServeConfig};
pub use error::{ServerError, ShutdownPhase, TransportError};
pub use lifecycle::{
    shutdown_signal, HttpListener, Lifecycle, LifecycleState, ListenerHandle, SHUTDOWN_GRACE,
};
pub use server::{create_router, RouterConfig};
pub use transport::{SseTransport, StreamingTransport, TransportService};
