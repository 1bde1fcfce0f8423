//! Result update messages pushed on the submission event stream.
//!
//! The `GET /submission/{user_id}/{submission_id}/events` endpoint pushes one
//! JSON record per event.
//!
//! # Protocol
//!
//! 1. The first record has `status = "connected"` and only confirms the
//!    subscription.
//! 2. Records with any other non-terminal `status` report progress.
//! 3. A record with `status = "completed"` carries the verdict, score and
//!    diagnostics.  Nothing follows it.
//!
//! ```json
//! {"status":"connected","message":"Connected to submission updates"}
//! {"status":"completed","result":"AC","score":100,"time":"0.01","memory":"3412"}
//! ```

use serde::{Deserialize, Serialize};

use super::ids::SubmissionId;
use super::lenient;

/// `status` value of the subscription sentinel.
pub const STATUS_CONNECTED: &str = "connected";
/// `status` value of the final record.
pub const STATUS_COMPLETED: &str = "completed";

/// One record from the event stream.
///
/// Every field is optional on the wire; absent fields decode to their
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionUpdate {
    pub submission_id: Option<SubmissionId>,
    #[serde(deserialize_with = "lenient::text")]
    pub status: String,
    /// Verdict code (`AC`, `WA`, ...); drives the result state machine.
    #[serde(deserialize_with = "lenient::text")]
    pub result: String,
    #[serde(deserialize_with = "lenient::int")]
    pub score: Option<i64>,
    #[serde(alias = "std_output", deserialize_with = "lenient::text")]
    pub stdout: String,
    #[serde(alias = "std_error", deserialize_with = "lenient::text")]
    pub stderr: String,
    #[serde(deserialize_with = "lenient::text")]
    pub compile_output: String,
    #[serde(deserialize_with = "lenient::int")]
    pub exit_signal: Option<i64>,
    #[serde(deserialize_with = "lenient::int")]
    pub exit_code: Option<i64>,
    /// Elapsed time as reported by the sandbox (seconds, free-form).
    #[serde(deserialize_with = "lenient::text")]
    pub time: String,
    /// Peak memory as reported by the sandbox (KiB, free-form).
    #[serde(deserialize_with = "lenient::text")]
    pub memory: String,
    #[serde(deserialize_with = "lenient::text")]
    pub message: String,
    #[serde(deserialize_with = "lenient::list")]
    pub wrong_answers: Vec<WrongAnswer>,
}

/// A test case the submission failed, with the output it produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrongAnswer {
    pub test_case_id: String,
    pub stdout: String,
}

/// How the event channel treats a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Subscription sentinel; never forwarded.
    Connected,
    /// Final record; forwarded, then the channel closes.
    Completed,
    /// Anything else; forwarded, channel stays open.
    InProgress,
}

impl SubmissionUpdate {
    pub fn kind(&self) -> UpdateKind {
        let status = self.status.trim();
        if status.eq_ignore_ascii_case(STATUS_CONNECTED) {
            UpdateKind::Connected
        } else if status.eq_ignore_ascii_case(STATUS_COMPLETED) {
            UpdateKind::Completed
        } else {
            UpdateKind::InProgress
        }
    }
}
