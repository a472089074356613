//! proctor-report — Read-only review paths over finished attempts.
//!
//! The result aggregator ([`summary`]) turns finished attempts into
//! right/wrong summaries; the analysis engine ([`analysis`]) reconstructs
//! per-question and per-option correctness from the answer records. Both
//! take no locks and run against whatever snapshot the store serves.

pub mod analysis;
pub mod summary;

use std::time::Duration;

pub use analysis::{AttemptAnalyzer, OptionAnalysis, OptionView, QuestionVerdict};
pub use summary::{AttemptSummary, ExamResults, ResultSummarizer};

/// Configuration shared by the review paths.
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    /// Deadline applied to every collaborator call.
    pub store_deadline: Duration,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            store_deadline: Duration::from_secs(5),
        }
    }
}
