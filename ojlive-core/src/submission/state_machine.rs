//! Reduction of channel updates into a monotonic submission record.
//!
//! ```text
//! Pending ──► Judging ──► Accepted | WrongAnswer | TimeLimitExceeded
//!    │                    | CompileError | RuntimeError | OtherError
//!    └────────────────────────────▲
//! ```
//!
//! Only the `result` field moves the status.  A terminal status is final:
//! every later update is ignored, whatever it says.

use ojlive_sdk::objects::{
    Language, ProblemId, ReportedResult, Score, SourceCode, SubmissionHandle, SubmissionId,
    SubmissionStatus, SubmissionUpdate, UserId, WrongAnswer,
};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::debug;

use crate::events::CloseReason;

/// Judge output attached to a submission.
///
/// Every applied update is merged in; fields the update leaves empty keep
/// their previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub stdout: String,
    pub stderr: String,
    pub compile_output: String,
    pub time: String,
    pub memory: String,
    pub message: String,
    pub exit_code: Option<i64>,
    pub exit_signal: Option<i64>,
    pub wrong_answers: Vec<WrongAnswer>,
}

impl Diagnostics {
    fn merge(&mut self, update: &SubmissionUpdate) {
        fn take(slot: &mut String, value: &str) {
            if !value.is_empty() {
                value.clone_into(slot);
            }
        }

        take(&mut self.stdout, &update.stdout);
        take(&mut self.stderr, &update.stderr);
        take(&mut self.compile_output, &update.compile_output);
        take(&mut self.time, &update.time);
        take(&mut self.memory, &update.memory);
        take(&mut self.message, &update.message);
        if update.exit_code.is_some() {
            self.exit_code = update.exit_code;
        }
        if update.exit_signal.is_some() {
            self.exit_signal = update.exit_signal;
        }
        if !update.wrong_answers.is_empty() {
            self.wrong_answers.clone_from(&update.wrong_answers);
        }
    }
}

/// A submission as seen by the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub problem_id: ProblemId,
    pub user_id: UserId,
    pub language: Language,
    #[serde(skip)]
    pub source: SourceCode,
    pub created_at: OffsetDateTime,
    pub status: SubmissionStatus,
    /// Set together with the terminal status, never before.
    pub score: Option<Score>,
    pub diagnostics: Diagnostics,
    /// Why the event channel closed.  A closed submission is immutable.
    pub closed: Option<CloseReason>,
    /// Most recent error reported by the event channel.
    pub last_error: Option<String>,
}

impl Submission {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_sealed(&self) -> bool {
        self.closed.is_some()
    }

    /// Terminal with `Accepted`.
    pub fn is_accepted(&self) -> bool {
        self.status == SubmissionStatus::Accepted
    }
}

impl From<SubmissionHandle> for Submission {
    fn from(handle: SubmissionHandle) -> Self {
        Self {
            id: handle.id,
            problem_id: handle.problem_id,
            user_id: handle.user_id,
            language: handle.language,
            source: handle.source,
            created_at: handle.created_at,
            status: handle.status,
            score: None,
            diagnostics: Diagnostics::default(),
            closed: None,
            last_error: None,
        }
    }
}

/// Outcome of [`SubmissionStateMachine::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The status moved forward.
    Advanced,
    /// Status kept; diagnostics may have been merged.
    Unchanged,
    /// The record is terminal or sealed; nothing was applied.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct SubmissionStateMachine {
    submission: Submission,
}

impl SubmissionStateMachine {
    pub fn new(submission: impl Into<Submission>) -> Self {
        Self {
            submission: submission.into(),
        }
    }

    pub fn current(&self) -> &Submission {
        &self.submission
    }

    /// Whether updates can still change the record.
    pub fn is_open(&self) -> bool {
        !self.submission.is_terminal() && !self.submission.is_sealed()
    }

    pub fn apply(&mut self, update: &SubmissionUpdate) -> Transition {
        let submission = &mut self.submission;
        if submission.is_terminal() || submission.is_sealed() {
            debug!(
                submission_id = %submission.id,
                status = %submission.status,
                result = %update.result,
                "Ignoring update for a finished submission"
            );
            return Transition::Ignored;
        }

        submission.diagnostics.merge(update);
        match ReportedResult::classify(&update.result) {
            ReportedResult::Unreported => Transition::Unchanged,
            ReportedResult::InProgress => {
                if submission.status == SubmissionStatus::Pending {
                    submission.status = SubmissionStatus::Judging;
                    Transition::Advanced
                } else {
                    Transition::Unchanged
                }
            }
            ReportedResult::Final(status) => {
                let score = Score::clamped(update.score.unwrap_or(0));
                debug!(submission_id = %submission.id, %status, %score, "Submission reached a verdict");
                submission.status = status;
                submission.score = Some(score);
                Transition::Advanced
            }
        }
    }

    /// Record an error reported by the channel.  Ignored once sealed.
    pub fn record_error(&mut self, message: impl Into<String>) {
        if !self.submission.is_sealed() {
            self.submission.last_error = Some(message.into());
        }
    }

    /// Freeze the record.  The first reason wins.
    pub fn seal(&mut self, reason: CloseReason) -> bool {
        if self.submission.closed.is_some() {
            return false;
        }
        self.submission.closed = Some(reason);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> SubmissionStateMachine {
        let handle = SubmissionHandle {
            id: SubmissionId::from("S1"),
            problem_id: ProblemId::from("P1"),
            user_id: UserId::from("U1"),
            language: Language::from("python"),
            source: SourceCode::new("print(1)").unwrap(),
            status: SubmissionStatus::Pending,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        SubmissionStateMachine::new(handle)
    }

    fn update(status: &str, result: &str, score: Option<i64>) -> SubmissionUpdate {
        SubmissionUpdate {
            status: status.to_owned(),
            result: result.to_owned(),
            score,
            ..SubmissionUpdate::default()
        }
    }

    #[test]
    fn test_starts_pending_without_score() {
        let machine = pending();
        assert_eq!(machine.current().status, SubmissionStatus::Pending);
        assert_eq!(machine.current().score, None);
        assert!(machine.is_open());
    }

    #[test]
    fn test_progress_then_verdict() {
        let mut machine = pending();

        assert_eq!(machine.apply(&update("judging", "", None)), Transition::Unchanged);
        assert_eq!(
            machine.apply(&update("judging", "running", None)),
            Transition::Advanced
        );
        assert_eq!(machine.current().status, SubmissionStatus::Judging);
        assert_eq!(machine.current().score, None);

        assert_eq!(
            machine.apply(&update("judging", "compiling", None)),
            Transition::Unchanged
        );
        assert_eq!(
            machine.apply(&update("completed", "AC", Some(100))),
            Transition::Advanced
        );
        assert_eq!(machine.current().status, SubmissionStatus::Accepted);
        assert_eq!(machine.current().score, Some(Score::clamped(100)));
    }

    #[test]
    fn test_verdict_without_progress_is_allowed() {
        let mut machine = pending();
        machine.apply(&update("completed", "tle", Some(40)));
        assert_eq!(machine.current().status, SubmissionStatus::TimeLimitExceeded);
        assert_eq!(machine.current().score.map(Score::value), Some(40));
    }

    #[test]
    fn test_terminal_state_is_final() {
        let mut machine = pending();
        machine.apply(&update("completed", "WA", Some(0)));

        let mut late = update("completed", "AC", Some(100));
        late.stdout = "late".to_owned();
        assert_eq!(machine.apply(&late), Transition::Ignored);
        assert_eq!(machine.apply(&update("judging", "running", None)), Transition::Ignored);

        let current = machine.current();
        assert_eq!(current.status, SubmissionStatus::WrongAnswer);
        assert_eq!(current.score.map(Score::value), Some(0));
        assert_eq!(current.diagnostics.stdout, "");
    }

    #[test]
    fn test_missing_or_out_of_range_score() {
        let mut machine = pending();
        machine.apply(&update("completed", "CE", None));
        assert_eq!(machine.current().score.map(Score::value), Some(0));

        let mut machine = pending();
        machine.apply(&update("completed", "AC", Some(250)));
        assert_eq!(machine.current().score.map(Score::value), Some(100));
    }

    #[test]
    fn test_unknown_verdict_is_other_error() {
        let mut machine = pending();
        machine.apply(&update("completed", "MLE", Some(0)));
        assert_eq!(
            machine.current().status,
            SubmissionStatus::OtherError("MLE".into())
        );
    }

    #[test]
    fn test_diagnostics_are_merged() {
        let mut machine = pending();

        let mut first = update("judging", "running", None);
        first.compile_output = "ok".to_owned();
        machine.apply(&first);

        let mut last = update("completed", "RE", Some(0));
        last.stderr = "Traceback".to_owned();
        last.exit_code = Some(1);
        last.time = "0.02".to_owned();
        machine.apply(&last);

        let diagnostics = &machine.current().diagnostics;
        assert_eq!(diagnostics.compile_output, "ok");
        assert_eq!(diagnostics.stderr, "Traceback");
        assert_eq!(diagnostics.exit_code, Some(1));
        assert_eq!(diagnostics.time, "0.02");
    }

    #[test]
    fn test_sealed_record_ignores_updates() {
        let mut machine = pending();
        machine.apply(&update("judging", "running", None));
        assert!(machine.seal(CloseReason::TimedOut));
        assert!(!machine.seal(CloseReason::Cancelled));

        assert_eq!(
            machine.apply(&update("completed", "AC", Some(100))),
            Transition::Ignored
        );
        machine.record_error("late");

        let current = machine.current();
        assert_eq!(current.status, SubmissionStatus::Judging);
        assert_eq!(current.score, None);
        assert_eq!(current.closed, Some(CloseReason::TimedOut));
        assert_eq!(current.last_error, None);
    }
}
