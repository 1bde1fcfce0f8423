//! Dispatch-and-watch facade over the judge client and the event channel.

use std::sync::Arc;

use ojlive_sdk::auth::AuthToken;
use ojlive_sdk::client::{ClientError, JudgeClient};
use ojlive_sdk::objects::{Language, ProblemId, SourceCode, SubmissionHandle, SubmissionId, UserId};
use ojlive_sdk::transport::EventTransport;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::events::CloseReason;
use crate::processors::{ChannelConfig, ChannelHandle, SubmissionEventChannel, SubscribeError};
use crate::submission::{Submission, SubmissionTracker};

/// Push transport used for submission events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Server-sent events.
    #[default]
    Sse,
    #[serde(alias = "ws")]
    WebSocket,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to dispatch submission: {0}")]
    Dispatch(#[from] ClientError),
    #[error(transparent)]
    Subscribe(#[from] SubscribeError),
}

impl SessionError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SessionError::Dispatch(e) if e.is_unauthorized())
    }
}

/// One judge backend: the HTTP client plus the event channel built on it.
#[derive(Clone)]
pub struct JudgeSession {
    client: JudgeClient,
    channel: SubmissionEventChannel,
}

impl JudgeSession {
    pub fn new(client: JudgeClient, transport: TransportKind, config: ChannelConfig) -> Self {
        let transport: Arc<dyn EventTransport> = match transport {
            TransportKind::Sse => Arc::new(client.sse_transport()),
            TransportKind::WebSocket => Arc::new(client.websocket_transport()),
        };
        Self::with_channel(client, SubmissionEventChannel::from_shared(transport, config))
    }

    pub fn with_channel(client: JudgeClient, channel: SubmissionEventChannel) -> Self {
        Self { client, channel }
    }

    pub fn client(&self) -> &JudgeClient {
        &self.client
    }

    pub fn channel(&self) -> &SubmissionEventChannel {
        &self.channel
    }

    /// Dispatch a submission and subscribe to its result.
    ///
    /// Returns once the judge has accepted the submission; the returned
    /// [`WatchedSubmission`] follows it until the verdict arrives.
    pub async fn submit_and_watch(
        &self,
        problem_id: &ProblemId,
        user_id: &UserId,
        token: &AuthToken,
        source: &SourceCode,
        language: &Language,
    ) -> Result<WatchedSubmission, SessionError> {
        let handle = self
            .client
            .submit(problem_id, user_id, token, source, language)
            .await?;
        Ok(self.watch(handle, token.clone())?)
    }

    /// Subscribe to a submission that was already dispatched.
    pub fn watch(
        &self,
        handle: SubmissionHandle,
        token: AuthToken,
    ) -> Result<WatchedSubmission, SubscribeError> {
        let user_id = handle.user_id.clone();
        let submission_id = handle.id.clone();
        let (tracker, state) = SubmissionTracker::new(handle);
        let channel = self
            .channel
            .subscribe(user_id, submission_id, token, tracker)?;
        Ok(WatchedSubmission { channel, state })
    }
}

/// A submission followed over its event channel.
///
/// Dropping it closes the channel.
#[derive(Debug)]
pub struct WatchedSubmission {
    pub channel: ChannelHandle,
    pub state: watch::Receiver<Submission>,
}

impl WatchedSubmission {
    pub fn submission_id(&self) -> &SubmissionId {
        self.channel.submission_id()
    }

    pub fn current(&self) -> Submission {
        self.state.borrow().clone()
    }

    pub fn cancel(&self) {
        self.channel.close();
    }

    /// Wait for the channel to close and return the sealed record.
    pub async fn finished(self) -> (Submission, CloseReason) {
        let WatchedSubmission { channel, state } = self;
        let reason = channel.closed().await;
        let submission = state.borrow().clone();
        (submission, reason)
    }
}
