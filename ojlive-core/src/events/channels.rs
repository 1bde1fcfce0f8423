//! Event channel factories and handles.

use super::types::ChannelEvent;
use tokio::sync::mpsc;

/// Sender handle for ChannelEvent values.
///
/// Unbounded because observer callbacks are synchronous: a bounded sender
/// would have to drop events when full.  One channel produces a handful of
/// events, so the queue stays small.
pub type ChannelEventSender = mpsc::UnboundedSender<ChannelEvent>;
/// Receiver handle for ChannelEvent values.
pub type ChannelEventReceiver = mpsc::UnboundedReceiver<ChannelEvent>;

/// Create a new ChannelEvent channel.
///
/// The sender is itself a [`SubmissionObserver`](super::SubmissionObserver);
/// pass it to `subscribe` and read events from the receiver.  The receiver
/// yields `None` once the channel task has finished.
pub fn channel_event_channel() -> (ChannelEventSender, ChannelEventReceiver) {
    mpsc::unbounded_channel()
}
