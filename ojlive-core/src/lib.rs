#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod events;
pub mod processors;
pub mod session;
pub mod submission;

pub use events::{CloseReason, StreamError, SubmissionObserver};
pub use processors::{
    ChannelConfig, ChannelHandle, LeaderboardPoller, PollHandle, PollerConfig, RankingOrder,
    RankingSource, SubmissionEventChannel, SubscribeError,
};
pub use session::{JudgeSession, SessionError, TransportKind, WatchedSubmission};
pub use submission::{Submission, SubmissionStateMachine, SubmissionTracker, Transition};
