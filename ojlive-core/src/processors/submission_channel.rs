//! SubmissionEventChannel processor.
//!
//! The event channel is responsible for:
//! - Opening one push stream per submission through an [`EventTransport`]
//! - Decoding each payload into a [`SubmissionUpdate`]
//! - Swallowing the `connected` sentinel, forwarding everything else
//! - Closing itself after the `completed` record, on transport failure, on
//!   timeout, or when the owner cancels
//! - Keeping at most one open channel per submission id
//!
//! Each channel runs as its own task.  The task owns the stream and the
//! timeout timer, so both are released on every exit path.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::StreamExt;
use ojlive_sdk::auth::AuthToken;
use ojlive_sdk::objects::{SubmissionId, SubmissionUpdate, UpdateKind, UserId};
use ojlive_sdk::transport::{EventTransport, StreamTarget, TransportError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::events::{CloseReason, StreamError, SubmissionObserver};

/// Liveness ceiling: a judge run that has not finished after this long is
/// abandoned.
pub const DEFAULT_JUDGE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Configuration for the event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Time allowed between subscribing and the terminal record.
    pub timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_JUDGE_TIMEOUT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubscribeError {
    #[error("an event channel for submission {0} is already open")]
    AlreadyOpen(SubmissionId),
}

type OpenChannels = Arc<Mutex<HashSet<SubmissionId>>>;

/// Registry slot held by a running channel task.
///
/// Dropping it frees the submission id for a new subscription.
struct Registration {
    open: OpenChannels,
    submission_id: SubmissionId,
}

impl Registration {
    fn acquire(open: &OpenChannels, submission_id: SubmissionId) -> Result<Self, SubscribeError> {
        let mut ids = open.lock().unwrap_or_else(PoisonError::into_inner);
        if !ids.insert(submission_id.clone()) {
            return Err(SubscribeError::AlreadyOpen(submission_id));
        }
        Ok(Self {
            open: Arc::clone(open),
            submission_id,
        })
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.submission_id);
    }
}

// ---------------------------------------------------------------------------
// SubmissionEventChannel
// ---------------------------------------------------------------------------

/// Opens submission event channels over a shared transport.
///
/// Cheap to clone; clones share the transport and the open-channel registry.
#[derive(Clone)]
pub struct SubmissionEventChannel {
    transport: Arc<dyn EventTransport>,
    config: ChannelConfig,
    open: OpenChannels,
}

impl SubmissionEventChannel {
    pub fn new(transport: impl EventTransport, config: ChannelConfig) -> Self {
        Self::from_shared(Arc::new(transport), config)
    }

    pub fn from_shared(transport: Arc<dyn EventTransport>, config: ChannelConfig) -> Self {
        Self {
            transport,
            config,
            open: Arc::default(),
        }
    }

    pub fn config(&self) -> ChannelConfig {
        self.config
    }

    /// Whether a channel for `submission_id` is currently open.
    pub fn is_open(&self, submission_id: &SubmissionId) -> bool {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(submission_id)
    }

    /// Subscribe to result updates for one submission.
    ///
    /// Spawns the channel task on the current tokio runtime and returns
    /// immediately.  `observer` receives every callback from that task.
    ///
    /// Fails with [`SubscribeError::AlreadyOpen`] if a channel for the same
    /// submission is still open.
    pub fn subscribe<O: SubmissionObserver>(
        &self,
        user_id: UserId,
        submission_id: SubmissionId,
        token: AuthToken,
        observer: O,
    ) -> Result<ChannelHandle, SubscribeError> {
        let registration = Registration::acquire(&self.open, submission_id.clone())?;
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let target = StreamTarget::new(user_id, submission_id.clone(), token);
        let transport = Arc::clone(&self.transport);
        let timeout = self.config.timeout;

        let task = tokio::spawn(async move {
            let _registration = registration;
            run_channel(transport, target, observer, cancel_rx, timeout).await
        });

        Ok(ChannelHandle {
            submission_id,
            cancel_tx,
            task: Some(task),
        })
    }
}

// ---------------------------------------------------------------------------
// ChannelHandle
// ---------------------------------------------------------------------------

/// Owner's handle to an open channel.
///
/// Dropping the handle closes the channel.
pub struct ChannelHandle {
    submission_id: SubmissionId,
    cancel_tx: watch::Sender<bool>,
    task: Option<JoinHandle<CloseReason>>,
}

impl ChannelHandle {
    pub fn submission_id(&self) -> &SubmissionId {
        &self.submission_id
    }

    /// Close the channel.  Idempotent; a no-op once the channel has closed
    /// by itself.
    pub fn close(&self) {
        self.cancel_tx.send_replace(true);
    }

    /// Whether the channel task has finished.
    pub fn is_closed(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the channel to close and return why it closed.
    pub async fn closed(mut self) -> CloseReason {
        let Some(task) = self.task.take() else {
            return CloseReason::Cancelled;
        };
        match task.await {
            Ok(reason) => reason,
            Err(e) => {
                error!(submission_id = %self.submission_id, error = %e, "Event channel task failed");
                CloseReason::Cancelled
            }
        }
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.cancel_tx.send_replace(true);
    }
}

impl std::fmt::Debug for ChannelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelHandle")
            .field("submission_id", &self.submission_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Channel task
// ---------------------------------------------------------------------------

async fn run_channel<O: SubmissionObserver>(
    transport: Arc<dyn EventTransport>,
    target: StreamTarget,
    mut observer: O,
    mut cancel_rx: watch::Receiver<bool>,
    timeout: Duration,
) -> CloseReason {
    let submission_id = target.submission_id.clone();
    info!(%submission_id, ?timeout, "Submission event channel opening");

    // The stream lives inside `drive`, so it is released before any of the
    // closing callbacks run.
    let reason = drive(
        transport.as_ref(),
        &target,
        &mut observer,
        &mut cancel_rx,
        timeout,
    )
    .await;

    if reason.completes() {
        observer.on_complete(reason);
    }
    observer.on_close(reason);
    info!(%submission_id, %reason, "Submission event channel closed");
    reason
}

async fn drive<O: SubmissionObserver>(
    transport: &dyn EventTransport,
    target: &StreamTarget,
    observer: &mut O,
    cancel_rx: &mut watch::Receiver<bool>,
    timeout: Duration,
) -> CloseReason {
    let submission_id = &target.submission_id;
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    let mut stream = tokio::select! {
        biased;

        _ = cancelled(cancel_rx) => return CloseReason::Cancelled,

        _ = &mut deadline => {
            warn!(%submission_id, "Timed out before the event stream opened");
            observer.on_error(StreamError::TimedOut(timeout));
            return CloseReason::TimedOut;
        }

        opened = transport.open(target) => match opened {
            Ok(stream) => stream,
            Err(e) => {
                warn!(%submission_id, error = %e, "Failed to open event stream");
                observer.on_error(e.into());
                return CloseReason::TransportFailed;
            }
        },
    };
    debug!(%submission_id, "Event stream opened");

    loop {
        tokio::select! {
            biased;

            _ = cancelled(cancel_rx) => return CloseReason::Cancelled,

            _ = &mut deadline => {
                warn!(%submission_id, ?timeout, "No terminal event before the deadline, closing");
                observer.on_error(StreamError::TimedOut(timeout));
                return CloseReason::TimedOut;
            }

            next = stream.next() => match next {
                Some(Ok(payload)) => {
                    if let Some(reason) = handle_payload(submission_id, &payload, observer) {
                        return reason;
                    }
                }
                Some(Err(e)) => {
                    warn!(%submission_id, error = %e, "Event stream failed");
                    observer.on_error(e.into());
                    return CloseReason::TransportFailed;
                }
                None => {
                    warn!(%submission_id, "Event stream ended before a terminal event");
                    observer.on_error(StreamError::Transport(TransportError::Closed));
                    return CloseReason::TransportFailed;
                }
            },
        }
    }
}

/// Decode and route one payload.  Returns the close reason if the channel
/// must close.
fn handle_payload<O: SubmissionObserver>(
    submission_id: &SubmissionId,
    payload: &str,
    observer: &mut O,
) -> Option<CloseReason> {
    let update: SubmissionUpdate = match serde_json::from_str(payload) {
        Ok(update) => update,
        Err(source) => {
            warn!(%submission_id, error = %source, "Discarding malformed event");
            observer.on_error(StreamError::Parse {
                payload: payload.to_owned(),
                source,
            });
            return None;
        }
    };

    match update.kind() {
        UpdateKind::Connected => {
            debug!(%submission_id, "Event channel connected");
            None
        }
        UpdateKind::Completed => {
            debug!(%submission_id, result = %update.result, "Received terminal event");
            observer.on_update(update);
            Some(CloseReason::Completed)
        }
        UpdateKind::InProgress => {
            debug!(%submission_id, status = %update.status, result = %update.result, "Received progress event");
            observer.on_update(update);
            None
        }
    }
}

/// Resolves once the owner has asked the channel to close.
async fn cancelled(cancel_rx: &mut watch::Receiver<bool>) {
    loop {
        if *cancel_rx.borrow_and_update() {
            return;
        }
        // The sender lives in the handle, whose Drop sends `true` first.
        if cancel_rx.changed().await.is_err() {
            return;
        }
    }
}
