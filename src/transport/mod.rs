//! Streaming transport seam.
//!
//! The HTTP layer treats the streaming transport as a pair of capabilities:
//! handle an arbitrary request, and shut down before a deadline. Anything
//! that implements [`StreamingTransport`] can sit behind the router.
//!
//! [`SseTransport`] is the built-in implementation used by the binary.

pub mod sse;

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;
use tokio::time::Instant;
use tower::Service;

use crate::error::TransportError;

pub use sse::{SseTransport, MESSAGE_PATH, SSE_PATH};

/// A long-lived streaming transport the router forwards traffic to.
#[async_trait]
pub trait StreamingTransport: Send + Sync + 'static {
    /// Handle a request the router did not serve locally.
    ///
    /// The request arrives unmodified; the transport owns routing of its own
    /// endpoints and the not-found response for everything else.
    async fn handle(&self, request: Request) -> Response;

    /// Drain open sessions and stop accepting new ones.
    ///
    /// Must return an error if the drain could not complete by `deadline`.
    async fn shutdown(&self, deadline: Instant) -> Result<(), TransportError>;
}

/// Adapts a shared [`StreamingTransport`] into a tower [`Service`] so it can
/// be mounted as an axum fallback.
pub struct TransportService<T> {
    transport: Arc<T>,
}

impl<T> TransportService<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }
}

impl<T> Clone for TransportService<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: StreamingTransport> Service<Request> for TransportService<T> {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let transport = Arc::clone(&self.transport);
        Box::pin(async move { Ok(transport.handle(request).await) })
    }
}
