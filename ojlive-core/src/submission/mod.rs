//! Client-side submission records.

pub mod state_machine;
pub mod tracker;

pub use state_machine::{Diagnostics, Submission, SubmissionStateMachine, Transition};
pub use tracker::SubmissionTracker;
