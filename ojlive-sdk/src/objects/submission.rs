//! Submission dispatch request and response types.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::ids::{Language, ProblemId, SubmissionId, UserId};
use super::verdict::SubmissionStatus;

/// Rejected input, caught before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("source code is empty")]
    EmptySource,
}

/// Non-empty source text.
///
/// The dispatcher only accepts a `SourceCode`, so an empty submission can
/// never reach the judge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SourceCode(String);

impl SourceCode {
    /// Fails with [`ValidationError::EmptySource`] for empty or
    /// whitespace-only text.
    pub fn new(text: impl Into<String>) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::EmptySource);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SourceCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Body of `POST /api/submit/{user_id}/{problem_id}`.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest<'a> {
    pub source_code: &'a str,
    pub language: &'a str,
    pub result: &'static str,
    pub score: i64,
}

impl<'a> SubmitRequest<'a> {
    pub fn new(source: &'a SourceCode, language: &'a Language) -> Self {
        Self {
            source_code: source.as_str(),
            language: language.as_str(),
            result: "pending",
            score: 0,
        }
    }
}

/// The created submission record returned by the submit endpoint.
///
/// Only `id` is required; the backend may echo more of the record.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionRecord {
    #[serde(alias = "submission_id")]
    pub id: SubmissionId,
    #[serde(default)]
    pub problem_id: Option<ProblemId>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub language: Option<Language>,
}

/// A dispatched submission.
///
/// Returned by the dispatcher once the judge has accepted the request.  The
/// submission starts out [`SubmissionStatus::Pending`]; judging happens
/// asynchronously.
#[derive(Debug, Clone)]
pub struct SubmissionHandle {
    pub id: SubmissionId,
    pub problem_id: ProblemId,
    pub user_id: UserId,
    pub language: Language,
    pub source: SourceCode,
    pub status: SubmissionStatus,
    /// Local time at which the judge acknowledged the submission.
    pub created_at: OffsetDateTime,
}

impl SubmissionHandle {
    /// Combine the judge's record with what the caller sent.  Values echoed
    /// by the judge win over the request values.
    pub fn from_record(
        record: SubmissionRecord,
        problem_id: ProblemId,
        user_id: UserId,
        language: Language,
        source: SourceCode,
    ) -> Self {
        Self {
            id: record.id,
            problem_id: record.problem_id.unwrap_or(problem_id),
            user_id: record.user_id.unwrap_or(user_id),
            language: record.language.unwrap_or(language),
            source,
            status: SubmissionStatus::Pending,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}
