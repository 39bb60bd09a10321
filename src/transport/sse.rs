//! Server-Sent Events transport.
//!
//! # Endpoints
//!
//! - `GET /sse` - Open an event stream. The first event is `endpoint`, whose
//!   data is the URL the client must POST its messages to.
//! - `POST /message?sessionId={id}` - Relay a JSON message to the session's
//!   stream as a `message` event. Answers `202 Accepted`.
//!
//! Everything else gets a JSON `404`.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::extract::{Query, Request};
use axum::http::{Method, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::StreamingTransport;
use crate::error::TransportError;

/// Path that opens an event stream.
pub const SSE_PATH: &str = "/sse";

/// Path clients post their messages to.
pub const MESSAGE_PATH: &str = "/message";

/// Default interval between keep-alive comments.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Events buffered per session before a POST waits for the stream.
const SESSION_BUFFER: usize = 64;

/// Largest accepted message body.
const MAX_MESSAGE_BYTES: usize = 4 * 1024 * 1024;

/// Registered sessions, keyed by session id.
type Sessions = HashMap<String, mpsc::Sender<Event>>;
type SessionMap = Arc<Mutex<Sessions>>;

/// The map is never left half-updated, so a poisoned lock is still usable.
fn lock_sessions(sessions: &SessionMap) -> MutexGuard<'_, Sessions> {
    sessions.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Errors
// =============================================================================

/// Request-level failures, answered with a JSON error body.
#[derive(Debug, Error)]
enum SessionError {
    #[error("sessionId query parameter is required")]
    MissingSessionId,

    #[error("Session not found: {0}")]
    UnknownSession(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Server is shutting down")]
    ShuttingDown,

    #[error("No route for {method} {path}")]
    NotFound { method: Method, path: String },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            SessionError::MissingSessionId => (StatusCode::BAD_REQUEST, "missing_session"),
            SessionError::UnknownSession(_) => (StatusCode::NOT_FOUND, "session_not_found"),
            SessionError::InvalidMessage(_) => (StatusCode::BAD_REQUEST, "invalid_message"),
            SessionError::ShuttingDown => (StatusCode::SERVICE_UNAVAILABLE, "shutting_down"),
            SessionError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        };

        warn!(status = status.as_u16(), "{}", self);

        let body = ErrorBody {
            error,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

// =============================================================================
// Stream Tracking
// =============================================================================

/// Counts open event streams so shutdown can wait for them.
#[derive(Default)]
struct StreamTracker {
    active: AtomicUsize,
    drained: Notify,
}

impl StreamTracker {
    fn acquire(self: &Arc<Self>, sessions: &SessionMap, session_id: &str) -> StreamGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        StreamGuard {
            tracker: Arc::clone(self),
            sessions: Arc::clone(sessions),
            session_id: session_id.to_string(),
        }
    }

    fn release(&self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }

    fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    async fn wait_drained(&self, deadline: Instant) -> Result<(), TransportError> {
        loop {
            // Registered before the check so a release in between is not lost.
            let drained = self.drained.notified();
            if self.active() == 0 {
                return Ok(());
            }

            tokio::select! {
                _ = drained => {}
                _ = tokio::time::sleep_until(deadline) => {
                    return match self.active() {
                        0 => Ok(()),
                        remaining => Err(TransportError::DrainTimeout { remaining }),
                    };
                }
            }
        }
    }
}

/// Held by each open stream. Dropping the stream unregisters its session
/// and releases its slot.
struct StreamGuard {
    tracker: Arc<StreamTracker>,
    sessions: SessionMap,
    session_id: String,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if lock_sessions(&self.sessions).remove(&self.session_id).is_some() {
            debug!(session_id = %self.session_id, "SSE session closed");
        }
        self.tracker.release();
    }
}

// =============================================================================
// Transport
// =============================================================================

/// SSE transport with per-session message relay.
pub struct SseTransport {
    sessions: SessionMap,
    tracker: Arc<StreamTracker>,
    closing: AtomicBool,
    keep_alive: Duration,
}

impl SseTransport {
    /// Create a transport with the default keep-alive interval.
    pub fn new() -> Self {
        Self::with_keep_alive(DEFAULT_KEEP_ALIVE)
    }

    /// Create a transport with a custom keep-alive interval.
    pub fn with_keep_alive(keep_alive: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            tracker: Arc::new(StreamTracker::default()),
            closing: AtomicBool::new(false),
            keep_alive,
        }
    }

    /// Number of sessions currently registered.
    pub fn session_count(&self) -> usize {
        lock_sessions(&self.sessions).len()
    }

    /// Number of event streams that have not finished yet.
    pub fn open_streams(&self) -> usize {
        self.tracker.active()
    }

    async fn open_stream(&self) -> Result<Response, SessionError> {
        let session_id = Uuid::new_v4().to_string();
        let guard = self.tracker.acquire(&self.sessions, &session_id);
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);

        {
            let mut sessions = lock_sessions(&self.sessions);
            if self.closing.load(Ordering::SeqCst) {
                return Err(SessionError::ShuttingDown);
            }
            sessions.insert(session_id.clone(), tx);
        }

        info!(session_id = %session_id, "SSE session opened");

        let endpoint = Event::default()
            .event("endpoint")
            .data(format!("{}?sessionId={}", MESSAGE_PATH, session_id));

        let messages = stream::unfold((rx, guard), |(mut rx, guard)| async move {
            rx.recv().await.map(|event| (event, (rx, guard)))
        });

        let events = stream::once(async move { endpoint })
            .chain(messages)
            .map(Ok::<_, Infallible>);

        Ok(Sse::new(events)
            .keep_alive(KeepAlive::new().interval(self.keep_alive))
            .into_response())
    }

    async fn post_message(&self, request: Request) -> Result<Response, SessionError> {
        let session_id = Query::<MessageQuery>::try_from_uri(request.uri())
            .ok()
            .and_then(|Query(query)| query.session_id)
            .ok_or(SessionError::MissingSessionId)?;

        let body = to_bytes(request.into_body(), MAX_MESSAGE_BYTES)
            .await
            .map_err(|e| SessionError::InvalidMessage(e.to_string()))?;
        let message: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| SessionError::InvalidMessage(e.to_string()))?;

        let sender = lock_sessions(&self.sessions)
            .get(&session_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownSession(session_id.clone()))?;

        let event = Event::default().event("message").data(message.to_string());
        if sender.send(event).await.is_err() {
            // The client went away; forget the session.
            lock_sessions(&self.sessions).remove(&session_id);
            return Err(SessionError::UnknownSession(session_id));
        }

        debug!(session_id = %session_id, bytes = body.len(), "Message relayed");
        Ok(StatusCode::ACCEPTED.into_response())
    }
}

impl Default for SseTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamingTransport for SseTransport {
    async fn handle(&self, request: Request) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let result = if path == SSE_PATH && method == Method::GET {
            self.open_stream().await
        } else if path == MESSAGE_PATH && method == Method::POST {
            self.post_message(request).await
        } else {
            Err(SessionError::NotFound { method, path })
        };

        match result {
            Ok(response) => response,
            Err(e) => e.into_response(),
        }
    }

    async fn shutdown(&self, deadline: Instant) -> Result<(), TransportError> {
        let closed = {
            let mut sessions = lock_sessions(&self.sessions);
            self.closing.store(true, Ordering::SeqCst);
            let count = sessions.len();
            // Dropping the senders ends every stream once its queue is flushed.
            sessions.clear();
            count
        };

        info!(
            sessions = closed,
            open_streams = self.tracker.active(),
            "Closing SSE sessions"
        );

        self.tracker.wait_drained(deadline).await
    }
}

// =============================================================================
// Tests
// =============================================================================
