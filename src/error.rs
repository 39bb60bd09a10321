use std::fmt;
use std::io;

use thiserror::Error;

/// Errors reported by a streaming transport while shutting down.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Open streams did not finish before the deadline
    #[error("{remaining} stream(s) still open at the shutdown deadline")]
    DrainTimeout { remaining: usize },

    /// Transport-specific failure
    #[error("transport error: {0}")]
    Other(String),
}

/// The two phases of the shutdown sequence, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    Transport,
    Listener,
}

impl fmt::Display for ShutdownPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownPhase::Transport => f.write_str("transport"),
            ShutdownPhase::Listener => f.write_str("listener"),
        }
    }
}

/// Fatal server errors. None of these are retried.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The accept loop stopped with an error
    #[error("server error: {0}")]
    Serve(#[from] io::Error),

    /// The streaming transport failed to shut down
    #[error("error shutting down streaming transport: {0}")]
    TransportShutdown(#[from] TransportError),

    /// The HTTP listener failed to shut down
    #[error("error shutting down HTTP listener: {0}")]
    ListenerShutdown(String),

    /// A shutdown phase was still running when the shared deadline expired
    #[error("{phase} shutdown did not complete before the deadline")]
    DeadlineExceeded { phase: ShutdownPhase },
}
