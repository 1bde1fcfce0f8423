pub mod ids;
pub mod leaderboard;
pub mod submission;
pub mod update;
pub mod verdict;

mod lenient;

pub use ids::{ContestId, Language, ProblemId, SubmissionId, UserId};
pub use leaderboard::{RankingEntry, RankingSnapshot};
pub use submission::{SourceCode, SubmissionHandle, SubmissionRecord, SubmitRequest, ValidationError};
pub use update::{SubmissionUpdate, UpdateKind, WrongAnswer};
pub use verdict::{ReportedResult, Score, SubmissionStatus};
