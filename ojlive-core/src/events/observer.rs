//! Observer interface of the submission event channel.

use ojlive_sdk::objects::SubmissionUpdate;

use super::channels::ChannelEventSender;
use super::types::{ChannelEvent, CloseReason, StreamError};

/// Receives everything a submission event channel reports.
///
/// All methods are called from the channel's own task, one at a time and in
/// message-arrival order, so implementations need no synchronisation of
/// their own.
pub trait SubmissionObserver: Send + 'static {
    /// A forwarded update (in progress, or the terminal record).
    fn on_update(&mut self, update: SubmissionUpdate);

    /// A parse failure (channel stays open) or a failure that is about to
    /// close the channel.
    fn on_error(&mut self, error: StreamError);

    /// Fires once, after the terminal record or on timeout.
    fn on_complete(&mut self, reason: CloseReason);

    /// Fires once for every channel, after the transport has been released.
    fn on_close(&mut self, reason: CloseReason) {
        let _ = reason;
    }
}

/// Observer built from three closures.
pub struct FnObserver<U, E, C> {
    on_update: U,
    on_error: E,
    on_complete: C,
}

impl<U, E, C> FnObserver<U, E, C>
where
    U: FnMut(SubmissionUpdate) + Send + 'static,
    E: FnMut(StreamError) + Send + 'static,
    C: FnMut(CloseReason) + Send + 'static,
{
    pub fn new(on_update: U, on_error: E, on_complete: C) -> Self {
        Self {
            on_update,
            on_error,
            on_complete,
        }
    }
}

impl<U, E, C> SubmissionObserver for FnObserver<U, E, C>
where
    U: FnMut(SubmissionUpdate) + Send + 'static,
    E: FnMut(StreamError) + Send + 'static,
    C: FnMut(CloseReason) + Send + 'static,
{
    fn on_update(&mut self, update: SubmissionUpdate) {
        (self.on_update)(update)
    }

    fn on_error(&mut self, error: StreamError) {
        (self.on_error)(error)
    }

    fn on_complete(&mut self, reason: CloseReason) {
        (self.on_complete)(reason)
    }
}

// A dropped receiver only means nobody is listening any more.
impl SubmissionObserver for ChannelEventSender {
    fn on_update(&mut self, update: SubmissionUpdate) {
        let _ = self.send(ChannelEvent::Update(update));
    }

    fn on_error(&mut self, error: StreamError) {
        let _ = self.send(ChannelEvent::Error(error));
    }

    fn on_complete(&mut self, reason: CloseReason) {
        let _ = self.send(ChannelEvent::Complete(reason));
    }

    fn on_close(&mut self, reason: CloseReason) {
        let _ = self.send(ChannelEvent::Closed(reason));
    }
}
