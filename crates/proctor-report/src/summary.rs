//! Result aggregation over finished attempts.
//!
//! Right count is the stored score; wrong count is the pages answered minus
//! the score. "Most recent" is defined explicitly: completion timestamp
//! descending, ties broken by higher attempt id.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use proctor_core::error::EngineError;
use proctor_core::model::Attempt;
use proctor_core::traits::AttemptStore;

use crate::ReviewConfig;

/// Right/wrong summary of one finished attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptSummary {
    pub attempt_id: i64,
    pub right: u32,
    pub wrong: u32,
    pub finished_at: DateTime<Utc>,
}

/// The most recent finished attempt plus the full history for a
/// (user, exam) pair.
#[derive(Debug, Clone, Serialize)]
pub struct ExamResults {
    pub recent: AttemptSummary,
    /// All finished attempts, most recent first. Includes `recent`.
    pub history: Vec<AttemptSummary>,
}

/// Read-only aggregator over finished attempts.
pub struct ResultSummarizer {
    store: Arc<dyn AttemptStore>,
    config: ReviewConfig,
}

impl ResultSummarizer {
    pub fn new(store: Arc<dyn AttemptStore>, config: ReviewConfig) -> Self {
        Self { store, config }
    }

    /// Summaries of every finished attempt for the pair, most recent first.
    pub async fn history(
        &self,
        user_id: i64,
        exam_id: i64,
    ) -> Result<Vec<AttemptSummary>, EngineError> {
        let attempts = self
            .bounded(self.store.finished_attempts(user_id, exam_id))
            .await?;
        let mut summaries: Vec<AttemptSummary> =
            attempts.iter().filter_map(summarize_attempt).collect();
        sort_most_recent_first(&mut summaries);
        Ok(summaries)
    }

    /// The most recent finished attempt plus the history. `None` when the
    /// pair has no finished attempt — callers distinguish no data from
    /// failure.
    pub async fn summarize(
        &self,
        user_id: i64,
        exam_id: i64,
    ) -> Result<Option<ExamResults>, EngineError> {
        let history = self.history(user_id, exam_id).await?;
        Ok(history.first().cloned().map(|recent| ExamResults {
            recent,
            history,
        }))
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, EngineError>>,
    ) -> Result<T, EngineError> {
        match tokio::time::timeout(self.config.store_deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout(self.config.store_deadline)),
        }
    }
}

/// `None` for attempts that are still open; the aggregator only describes
/// finished ones.
fn summarize_attempt(attempt: &Attempt) -> Option<AttemptSummary> {
    let finished_at = attempt.finished_at?;
    Some(AttemptSummary {
        attempt_id: attempt.id,
        right: attempt.score,
        wrong: attempt.page_no.saturating_sub(attempt.score),
        finished_at,
    })
}

/// Completion timestamp descending, ties broken by higher attempt id.
fn sort_most_recent_first(summaries: &mut [AttemptSummary]) {
    summaries.sort_by(|a, b| {
        b.finished_at
            .cmp(&a.finished_at)
            .then(b.attempt_id.cmp(&a.attempt_id))
    });
}
