//! Event type definitions for the submission result pipeline.

use std::time::Duration;

use ojlive_sdk::objects::SubmissionUpdate;
use ojlive_sdk::transport::TransportError;
use serde::Serialize;

/// Why a submission event channel closed.
///
/// Exactly one reason is recorded per channel: whichever exit path is taken
/// first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// The terminal record was delivered.
    Completed,
    /// No terminal record arrived within the liveness ceiling.
    TimedOut,
    /// The connection failed, was refused, or ended early.
    TransportFailed,
    /// The owner closed the channel.
    Cancelled,
}

impl CloseReason {
    /// Whether `on_complete` fires for this reason.
    pub fn completes(self) -> bool {
        matches!(self, CloseReason::Completed | CloseReason::TimedOut)
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::Completed => write!(f, "completed"),
            CloseReason::TimedOut => write!(f, "timed out"),
            CloseReason::TransportFailed => write!(f, "transport failed"),
            CloseReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Errors reported to a channel observer.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The stream endpoint rejected the bearer token.  Closes the channel.
    #[error("event stream rejected credentials (status {status})")]
    Unauthorized { status: u16 },

    /// The connection could not be opened or broke.  Closes the channel.
    #[error("event stream transport failed: {0}")]
    Transport(TransportError),

    /// One message could not be decoded.  The channel stays open.
    #[error("malformed event stream message: {source}")]
    Parse {
        payload: String,
        #[source]
        source: serde_json::Error,
    },

    /// The judge did not finish within the liveness ceiling.  Closes the
    /// channel.
    #[error("no terminal event within {0:?}")]
    TimedOut(Duration),
}

/// Coarse classification of [`StreamError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamErrorKind {
    Auth,
    Transport,
    Parse,
    Timeout,
}

impl StreamError {
    pub fn kind(&self) -> StreamErrorKind {
        match self {
            StreamError::Unauthorized { .. } => StreamErrorKind::Auth,
            StreamError::Transport(_) => StreamErrorKind::Transport,
            StreamError::Parse { .. } => StreamErrorKind::Parse,
            StreamError::TimedOut(_) => StreamErrorKind::Timeout,
        }
    }
}

impl From<TransportError> for StreamError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unauthorized { status } => StreamError::Unauthorized { status },
            other => StreamError::Transport(other),
        }
    }
}

/// Everything a channel reports, as a single value.
///
/// Produced by the mpsc-backed observer for consumers that prefer a stream
/// over callbacks.
#[derive(Debug)]
pub enum ChannelEvent {
    Update(SubmissionUpdate),
    Error(StreamError),
    Complete(CloseReason),
    /// Always the last event; the transport has been released.
    Closed(CloseReason),
}
