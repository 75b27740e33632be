//! Domain-specific error types for the state transport.
//!
//! Establishment failures (`Dial`, `Listen`) are returned directly to the
//! caller. Everything that happens after a session is up is parked as a
//! sticky error and polled, so every variant is `Clone`: I/O causes are
//! shared behind an `Arc`.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// The canonical error type for the state transport.
#[derive(Debug, Clone, Error)]
pub enum NetError {
    // ── Establishment ────────────────────────────────────────────
    /// `join` could not connect to the remote host.
    #[error("failed to dial {addr}: {source}")]
    Dial {
        addr: String,
        #[source]
        source: Arc<io::Error>,
    },

    /// `host` could not bind its listening endpoint.
    #[error("failed to listen on {addr}: {source}")]
    Listen {
        addr: String,
        #[source]
        source: Arc<io::Error>,
    },

    /// The background accept attempt failed. Never retried.
    #[error("accept failed: {0}")]
    Accept(#[source] Arc<io::Error>),

    // ── Transport ────────────────────────────────────────────────
    /// A read or write on the established connection failed.
    #[error("transport failure: {0}")]
    Transport(#[source] Arc<io::Error>),

    /// A snapshot could not be serialized or a record could not be decoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The peer sent more bytes than a single record may occupy.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The remote side closed the stream between two records.
    #[error("stream ended by remote peer")]
    StreamEnded,

    // ── Lifecycle ────────────────────────────────────────────────
    /// The component was already closed.
    #[error("already closed")]
    AlreadyClosed,

    /// A background task panicked or was aborted.
    #[error("task error: {0}")]
    Task(String),
}

impl NetError {
    pub(crate) fn dial(addr: impl Into<String>, source: io::Error) -> Self {
        NetError::Dial {
            addr: addr.into(),
            source: Arc::new(source),
        }
    }

    pub(crate) fn listen(addr: impl Into<String>, source: io::Error) -> Self {
        NetError::Listen {
            addr: addr.into(),
            source: Arc::new(source),
        }
    }

    /// Mid-session read, write or decode fault.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            NetError::Transport(_) | NetError::Encoding(_) | NetError::FrameTooLarge { .. }
        )
    }

    /// The remote peer closed the connection cleanly.
    pub fn is_stream_ended(&self) -> bool {
        matches!(self, NetError::StreamEnded)
    }

    /// Conditions that close aggregation suppresses.
    pub fn is_benign(&self) -> bool {
        match self {
            NetError::AlreadyClosed => true,
            NetError::Transport(e) => e.kind() == io::ErrorKind::NotConnected,
            _ => false,
        }
    }
}

// ── Convenient From implementations ──────────────────────────────

impl From<io::Error> for NetError {
    fn from(e: io::Error) -> Self {
        NetError::Transport(Arc::new(e))
    }
}

impl From<serde_json::Error> for NetError {
    fn from(e: serde_json::Error) -> Self {
        NetError::Encoding(e.to_string())
    }
}

impl From<tokio::task::JoinError> for NetError {
    fn from(e: tokio::task::JoinError) -> Self {
        NetError::Task(e.to_string())
    }
}
