//! Long-running tasks of the client.
//!
//! - `SubmissionEventChannel`: one task per subscribed submission; turns the
//!   push stream into observer callbacks and enforces the judge timeout
//! - `LeaderboardPoller`: one task per polled contest; refreshes the ranking
//!   on a fixed cadence

pub mod leaderboard_poller;
pub mod submission_channel;

pub use leaderboard_poller::{
    DEFAULT_POLL_INTERVAL, LeaderboardPoller, PollHandle, PollerConfig, RankingOrder,
    RankingSource,
};
pub use submission_channel::{
    ChannelConfig, ChannelHandle, DEFAULT_JUDGE_TIMEOUT, SubmissionEventChannel, SubscribeError,
};
