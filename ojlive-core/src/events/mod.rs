//! Event system for the submission result pipeline.
//!
//! # Event Flow
//!
//! 1. The transport yields raw payloads.
//! 2. The event channel decodes them and calls a [`SubmissionObserver`].
//! 3. The observer (usually a `SubmissionTracker`) reduces updates into a
//!    `Submission` record.
//!
//! Callbacks are the primary interface; [`channel_event_channel`] adapts
//! them into an mpsc stream of [`ChannelEvent`].

pub mod channels;
pub mod observer;
pub mod types;

pub use channels::{ChannelEventReceiver, ChannelEventSender, channel_event_channel};
pub use observer::{FnObserver, SubmissionObserver};
pub use types::{ChannelEvent, CloseReason, StreamError, StreamErrorKind};
