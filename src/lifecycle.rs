//! Startup and shutdown coordination.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Bind listener → Spawn accept loop → Wait for signal
//!
//! Shutdown (one shared deadline):
//!     Signal received → Transport drains sessions → Listener stops → Exit
//! ```
//!
//! The transport always finishes before the listener starts closing, so no
//! streaming session can be accepted against a transport that is already
//! tearing down. Any failure, including an expired deadline, is returned to
//! the caller as fatal; nothing is retried.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info};

use crate::error::{ServerError, ShutdownPhase};
use crate::server::{create_router, RouterConfig};
use crate::transport::StreamingTransport;

/// Deadline shared by both shutdown phases.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Where the process is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    ShuttingDown,
    Stopped,
}

/// The listening side of the server, as seen by the coordinator.
#[async_trait]
pub trait ListenerHandle: Send {
    /// Resolves only if the accept loop stops without being asked to.
    async fn closed(&mut self) -> ServerError;

    /// Stop accepting and wait for open connections to finish.
    async fn shutdown(&mut self) -> Result<(), ServerError>;
}

// =============================================================================
// HTTP Listener
// =============================================================================

/// An axum accept loop running on a background task.
pub struct HttpListener {
    local_addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<io::Result<()>>,
}

impl HttpListener {
    /// Bind `addr` and start serving `router` in the background.
    ///
    /// A bind failure is returned immediately and never retried.
    pub async fn bind(addr: &str, router: Router) -> Result<Self, ServerError> {
        let bind_error = |source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        };

        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = stopped.await;
                })
                .await
        });

        info!(address = %local_addr, "HTTP listener started");

        Ok(Self {
            local_addr,
            stop: Some(stop),
            task,
        })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait]
impl ListenerHandle for HttpListener {
    async fn closed(&mut self) -> ServerError {
        match (&mut self.task).await {
            Ok(Ok(())) => ServerError::Serve(io::Error::other("accept loop exited unexpectedly")),
            Ok(Err(e)) => ServerError::Serve(e),
            Err(e) => ServerError::Serve(io::Error::other(e.to_string())),
        }
    }

    async fn shutdown(&mut self) -> Result<(), ServerError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }

        match (&mut self.task).await {
            Ok(result) => result.map_err(|e| ServerError::ListenerShutdown(e.to_string())),
            Err(e) => Err(ServerError::ListenerShutdown(e.to_string())),
        }
    }
}

// =============================================================================
// Coordinator
// =============================================================================

/// Owns the transport and listener for the lifetime of the process.
pub struct Lifecycle<T, L = HttpListener> {
    transport: Arc<T>,
    listener: L,
    state: LifecycleState,
    grace: Duration,
}

impl<T: StreamingTransport> Lifecycle<T, HttpListener> {
    /// Build the router around `transport`, bind `addr` and start serving.
    pub async fn bind(
        addr: &str,
        transport: Arc<T>,
        router_config: RouterConfig,
    ) -> Result<Self, ServerError> {
        let router = create_router(Arc::clone(&transport), router_config);
        let listener = HttpListener::bind(addr, router).await?;
        Ok(Self::new(transport, listener))
    }
}

impl<T: StreamingTransport, L: ListenerHandle> Lifecycle<T, L> {
    /// Coordinate an already running listener.
    pub fn new(transport: Arc<T>, listener: L) -> Self {
        Self {
            transport,
            listener,
            state: LifecycleState::Running,
            grace: SHUTDOWN_GRACE,
        }
    }

    /// Override the shutdown deadline.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Serve until `signal` resolves, then shut down.
    ///
    /// Returns early with [`ServerError::Serve`] if the accept loop fails
    /// before any signal arrives.
    pub async fn run<F>(&mut self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = signal => {}
            err = self.listener.closed() => return Err(err),
        }

        self.shutdown().await
    }

    /// Shut down the transport, then the listener, under one deadline.
    pub async fn shutdown(&mut self) -> Result<(), ServerError> {
        self.state = LifecycleState::ShuttingDown;
        info!("Shutting down server...");

        let deadline = Instant::now() + self.grace;

        match timeout_at(deadline, self.transport.shutdown(deadline)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ServerError::DeadlineExceeded {
                    phase: ShutdownPhase::Transport,
                })
            }
        }
        debug!(phase = %ShutdownPhase::Transport, "Shutdown phase complete");

        match timeout_at(deadline, self.listener.shutdown()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ServerError::DeadlineExceeded {
                    phase: ShutdownPhase::Listener,
                })
            }
        }
        debug!(phase = %ShutdownPhase::Listener, "Shutdown phase complete");

        self.state = LifecycleState::Stopped;
        info!("Server gracefully stopped");
        Ok(())
    }
}

// =============================================================================
// Signals
// =============================================================================

/// Resolve on Ctrl+C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
}

// =============================================================================
// Tests
// =============================================================================
