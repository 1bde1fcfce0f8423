//! Observer that keeps a [`Submission`] current and publishes it.

use ojlive_sdk::objects::{SubmissionHandle, SubmissionUpdate};
use tokio::sync::watch;
use tracing::debug;

use super::state_machine::{Submission, SubmissionStateMachine, Transition};
use crate::events::{CloseReason, StreamError, SubmissionObserver};

/// Feeds channel callbacks into a [`SubmissionStateMachine`].
///
/// Every change is published on a `watch` channel; presenters hold the
/// receiver.  The record is sealed when the channel closes, whatever the
/// reason.
pub struct SubmissionTracker {
    machine: SubmissionStateMachine,
    state_tx: watch::Sender<Submission>,
}

impl SubmissionTracker {
    pub fn new(handle: SubmissionHandle) -> (Self, watch::Receiver<Submission>) {
        let machine = SubmissionStateMachine::new(handle);
        let (state_tx, state_rx) = watch::channel(machine.current().clone());
        (Self { machine, state_tx }, state_rx)
    }

    pub fn current(&self) -> &Submission {
        self.machine.current()
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.machine.current().clone());
    }
}

impl SubmissionObserver for SubmissionTracker {
    fn on_update(&mut self, update: SubmissionUpdate) {
        if self.machine.apply(&update) != Transition::Ignored {
            self.publish();
        }
    }

    fn on_error(&mut self, error: StreamError) {
        self.machine.record_error(error.to_string());
        self.publish();
    }

    fn on_complete(&mut self, reason: CloseReason) {
        debug!(submission_id = %self.machine.current().id, %reason, "Judging finished");
    }

    fn on_close(&mut self, reason: CloseReason) {
        if self.machine.seal(reason) {
            self.publish();
        }
    }
}
