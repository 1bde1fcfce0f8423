//! Streaming-transport capability for result delivery.
//!
//! The event channel only needs "open a one-way stream of raw messages for
//! this submission".  [`EventTransport`] captures exactly that, so the
//! channel works the same over server-sent events, a WebSocket or any other
//! push mechanism.  Concrete transports live in the `client` module.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use url::Url;

use crate::auth::AuthToken;
use crate::objects::{SubmissionId, UserId};

/// Raw message payloads, in arrival order.  The stream ends when the server
/// closes the connection.
pub type RawEventStream = BoxStream<'static, Result<String, TransportError>>;

/// The submission a stream is scoped to.
#[derive(Debug, Clone)]
pub struct StreamTarget {
    pub user_id: UserId,
    pub submission_id: SubmissionId,
    pub token: AuthToken,
}

impl StreamTarget {
    pub fn new(user_id: UserId, submission_id: SubmissionId, token: AuthToken) -> Self {
        Self {
            user_id,
            submission_id,
            token,
        }
    }

    /// `submission/{user_id}/{submission_id}/events`, relative to the
    /// backend root (see [`endpoint`]).
    pub fn events_path(&self) -> String {
        format!(
            "submission/{}/{}/events",
            self.user_id.path_segment(),
            self.submission_id.path_segment()
        )
    }
}

/// Resolve `path` under `base_url`, keeping any path prefix the base
/// carries (`https://host/backend` + `api/x` is `https://host/backend/api/x`).
pub fn endpoint(base_url: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    base.join(path.trim_start_matches('/'))
}

/// Errors raised while opening or reading a stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The server rejected the bearer token (401/403).
    #[error("unauthorized: status {status}")]
    Unauthorized { status: u16 },

    /// The server answered the subscription with another non-2xx status.
    #[error("stream rejected: status {status}, body: {body}")]
    Rejected { status: u16, body: String },

    /// Connecting failed or the connection broke while reading.
    #[error("connection error: {0}")]
    Connection(String),

    /// The server ended the stream before sending a terminal record.
    #[error("stream closed before a terminal event")]
    Closed,

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Opens push streams.
#[async_trait]
pub trait EventTransport: Send + Sync + 'static {
    /// Open a stream for `target`.  Dropping the returned stream must
    /// release the underlying connection.
    async fn open(&self, target: &StreamTarget) -> Result<RawEventStream, TransportError>;
}

#[async_trait]
impl<T: EventTransport + ?Sized> EventTransport for Arc<T> {
    async fn open(&self, target: &StreamTarget) -> Result<RawEventStream, TransportError> {
        (**self).open(target).await
    }
}

#[async_trait]
impl<T: EventTransport + ?Sized> EventTransport for Box<T> {
    async fn open(&self, target: &StreamTarget) -> Result<RawEventStream, TransportError> {
        (**self).open(target).await
    }
}
