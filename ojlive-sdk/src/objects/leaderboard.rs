//! Leaderboard types.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::ids::UserId;

/// One row of `GET /api/leaderboard/{contest_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub user_id: UserId,
    pub username: String,
    pub total_score: i64,
    /// Time of the user's first submission, as sent by the backend.  Used
    /// only as a tie-breaker when re-sorting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_submission: Option<String>,
}

/// A complete ranking, replaced wholesale on every successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingSnapshot {
    /// Entries in display order; index 0 is rank 1.
    pub entries: Vec<RankingEntry>,
    pub fetched_at: OffsetDateTime,
}

impl RankingSnapshot {
    pub fn new(entries: Vec<RankingEntry>, fetched_at: OffsetDateTime) -> Self {
        Self {
            entries,
            fetched_at,
        }
    }

    /// Re-sort by total score (descending), then first submission
    /// (ascending, missing last).  The sort is stable, so rows the backend
    /// considers equal keep their order.
    pub fn sort_by_score(&mut self) {
        self.entries.sort_by_key(|entry| {
            (
                Reverse(entry.total_score),
                entry.first_submission.is_none(),
                entry.first_submission.clone(),
            )
        });
    }

    /// Entries paired with their 1-based rank.
    pub fn ranked(&self) -> impl Iterator<Item = (usize, &RankingEntry)> {
        self.entries.iter().enumerate().map(|(i, e)| (i + 1, e))
    }

    /// 1-based rank of `user_id`, if present.
    pub fn rank_of(&self, user_id: &UserId) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| &e.user_id == user_id)
            .map(|i| i + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
