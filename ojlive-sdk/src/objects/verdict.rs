//! Submission status vocabulary.
//!
//! The judge reports verdicts as short codes (`AC`, `WA`, `TLE`, ...) in the
//! `result` field of each update.  [`ReportedResult::classify`] maps those
//! codes onto [`SubmissionStatus`].

use std::fmt;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Status of a submission.
///
/// `Pending` and `Judging` are in progress; every other variant is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", content = "code", rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Judging,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    CompileError,
    RuntimeError,
    /// Any other verdict; carries the code the judge reported (`MLE`, `SE`,
    /// ...).
    OtherError(CompactString),
}

impl SubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubmissionStatus::Pending | SubmissionStatus::Judging)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionStatus::Pending => f.write_str("Pending"),
            SubmissionStatus::Judging => f.write_str("Judging"),
            SubmissionStatus::Accepted => f.write_str("Accepted"),
            SubmissionStatus::WrongAnswer => f.write_str("Wrong Answer"),
            SubmissionStatus::TimeLimitExceeded => f.write_str("Time Limit Exceeded"),
            SubmissionStatus::CompileError => f.write_str("Compile Error"),
            SubmissionStatus::RuntimeError => f.write_str("Runtime Error"),
            SubmissionStatus::OtherError(code) => write!(f, "Error ({code})"),
        }
    }
}

/// What a single update says about the verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedResult {
    /// No verdict information (`""` or `"pending"`).
    Unreported,
    /// The judge has picked the submission up.
    InProgress,
    /// A terminal verdict.
    Final(SubmissionStatus),
}

impl ReportedResult {
    /// Classify a `result` code.  Matching is case-insensitive and accepts
    /// both the short codes and their spelled-out snake_case names.
    pub fn classify(result: &str) -> Self {
        let code = result.trim();
        if code.is_empty() {
            return ReportedResult::Unreported;
        }
        match code.to_ascii_lowercase().as_str() {
            "pending" => ReportedResult::Unreported,
            "judging" | "running" | "compiling" | "queued" | "in_queue" | "processing" => {
                ReportedResult::InProgress
            }
            "ac" | "accepted" => ReportedResult::Final(SubmissionStatus::Accepted),
            "wa" | "wrong_answer" => ReportedResult::Final(SubmissionStatus::WrongAnswer),
            "tle" | "time_limit_exceeded" => {
                ReportedResult::Final(SubmissionStatus::TimeLimitExceeded)
            }
            "ce" | "ctle" | "compile_error" => {
                ReportedResult::Final(SubmissionStatus::CompileError)
            }
            "re" | "runtime_error" => ReportedResult::Final(SubmissionStatus::RuntimeError),
            _ => ReportedResult::Final(SubmissionStatus::OtherError(code.into())),
        }
    }
}

/// A score in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 100;

    /// Clamp a raw judge score into range.
    pub fn clamped(raw: i64) -> Self {
        Self(raw.clamp(0, i64::from(Self::MAX)) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_short_codes() {
        assert_eq!(
            ReportedResult::classify("AC"),
            ReportedResult::Final(SubmissionStatus::Accepted)
        );
        assert_eq!(
            ReportedResult::classify("wa"),
            ReportedResult::Final(SubmissionStatus::WrongAnswer)
        );
        assert_eq!(
            ReportedResult::classify("CTLE"),
            ReportedResult::Final(SubmissionStatus::CompileError)
        );
        assert_eq!(
            ReportedResult::classify("MLE"),
            ReportedResult::Final(SubmissionStatus::OtherError("MLE".into()))
        );
    }

    #[test]
    fn test_classify_non_terminal() {
        assert_eq!(ReportedResult::classify(""), ReportedResult::Unreported);
        assert_eq!(ReportedResult::classify("pending"), ReportedResult::Unreported);
        assert_eq!(ReportedResult::classify("Running"), ReportedResult::InProgress);
    }

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(Score::clamped(-5).value(), 0);
        assert_eq!(Score::clamped(42).value(), 42);
        assert_eq!(Score::clamped(250).value(), 100);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!SubmissionStatus::Pending.is_terminal());
        assert!(!SubmissionStatus::Judging.is_terminal());
        assert!(SubmissionStatus::Accepted.is_terminal());
        assert!(SubmissionStatus::OtherError("SE".into()).is_terminal());
    }
}
