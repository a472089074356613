//! Per-question and per-option answer analysis.
//!
//! Reconstructs review-screen correctness from the append-only answer
//! records instead of the attempt's cached score. Single-choice verdicts
//! use the flag stored at submission time; multi-choice verdicts recompute
//! set equality against the current catalog, so a catalog correction
//! retroactively changes the review.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use proctor_core::error::EngineError;
use proctor_core::model::{AnswerRecord, ChoiceOption, QuestionKind};
use proctor_core::scoring::correct_option_set;
use proctor_core::traits::{AttemptStore, CatalogReader};

use crate::ReviewConfig;

/// Review verdict for one question of an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionVerdict {
    pub question_id: i64,
    pub correct: bool,
}

/// One option of a question as shown on the review screen.
#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    /// Display label in catalog order: `A0`, `A1`, …
    pub label: String,
    pub content: String,
    /// Whether the catalog currently marks this option correct.
    pub correct: bool,
    /// Whether this attempt chose it.
    pub chosen: bool,
}

/// Option-level review of one question within an attempt.
#[derive(Debug, Clone, Serialize)]
pub struct OptionAnalysis {
    pub question_name: String,
    pub options: Vec<OptionView>,
    pub chosen_labels: Vec<String>,
}

/// Read-only analysis over an attempt's answer records.
pub struct AttemptAnalyzer {
    store: Arc<dyn AttemptStore>,
    catalog: Arc<dyn CatalogReader>,
    config: ReviewConfig,
}

impl AttemptAnalyzer {
    pub fn new(
        store: Arc<dyn AttemptStore>,
        catalog: Arc<dyn CatalogReader>,
        config: ReviewConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            config,
        }
    }

    /// A verdict for every question of the attempt's exam, in catalog
    /// order. Unanswered questions report `correct = false`.
    pub async fn question_analysis(
        &self,
        attempt_id: i64,
    ) -> Result<Vec<QuestionVerdict>, EngineError> {
        let attempt = self
            .bounded(self.store.attempt(attempt_id))
            .await?
            .ok_or_else(|| EngineError::not_found("attempt", attempt_id))?;
        let questions = self
            .bounded(self.catalog.questions(attempt.exam_id))
            .await?;
        let records = self
            .bounded(self.store.answers_for_attempt(attempt_id))
            .await?;

        let mut verdicts = Vec::with_capacity(questions.len());
        for question in questions {
            let rows = latest_rows(&records, question.id);
            let correct = match question.kind {
                QuestionKind::Single => rows.last().map(|r| r.correct).unwrap_or(false),
                QuestionKind::Multi => {
                    if rows.is_empty() {
                        false
                    } else {
                        let options = self.bounded(self.catalog.options(question.id)).await?;
                        chosen_set(&rows) == correct_option_set(&options)
                    }
                }
            };
            verdicts.push(QuestionVerdict {
                question_id: question.id,
                correct,
            });
        }
        Ok(verdicts)
    }

    /// Option-level breakdown of one question within an attempt.
    pub async fn option_analysis(
        &self,
        attempt_id: i64,
        question_id: i64,
    ) -> Result<OptionAnalysis, EngineError> {
        let attempt = self
            .bounded(self.store.attempt(attempt_id))
            .await?
            .ok_or_else(|| EngineError::not_found("attempt", attempt_id))?;
        let question = self
            .bounded(self.catalog.question(question_id))
            .await?
            .ok_or_else(|| EngineError::not_found("question", question_id))?;
        if question.exam_id != attempt.exam_id {
            return Err(EngineError::not_found("question", question_id));
        }

        let options = self.bounded(self.catalog.options(question_id)).await?;
        let records = self
            .bounded(self.store.answers_for_question(attempt_id, question_id))
            .await?;
        let chosen = chosen_set(&latest_rows(&records, question_id));

        let options = label_options(&options, &chosen);
        let chosen_labels = options
            .iter()
            .filter(|o| o.chosen)
            .map(|o| o.label.clone())
            .collect();

        Ok(OptionAnalysis {
            question_name: question.name,
            options,
            chosen_labels,
        })
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

/// The records of the latest submission for a question: highest revision
/// only, insertion order preserved.
fn latest_rows(records: &[AnswerRecord], question_id: i64) -> Vec<&AnswerRecord> {
    let for_question = records.iter().filter(|r| r.question_id == question_id);
    let Some(latest) = for_question.clone().map(|r| r.revision).max() else {
        return Vec::new();
    };
    for_question.filter(|r| r.revision == latest).collect()
}

fn chosen_set(rows: &[&AnswerRecord]) -> BTreeSet<i64> {
    rows.iter().map(|r| r.option_id).collect()
}

/// Assign display labels in catalog order and mark the chosen options.
fn label_options(options: &[ChoiceOption], chosen: &BTreeSet<i64>) -> Vec<OptionView> {
    options
        .iter()
        .enumerate()
        .map(|(index, option)| OptionView {
            label: format!("A{index}"),
            content: option.content.clone(),
            correct: option.is_correct(),
            chosen: chosen.contains(&option.id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(question_id: i64, option_id: i64, revision: u32, correct: bool) -> AnswerRecord {
        AnswerRecord {
            id: 0,
            attempt_id: 1,
            question_id,
            option_id,
            multi_choice: true,
            correct,
            revision,
            created_at: Utc::now(),
        }
    }

    fn option(id: i64, weight: u8) -> ChoiceOption {
        ChoiceOption {
            id,
            question_id: 20,
            content: format!("option {id}"),
            weight,
        }
    }

    #[test]
    fn latest_rows_pick_the_highest_revision() {
        let records = vec![
            record(20, 200, 1, true),
            record(20, 201, 1, true),
            record(20, 200, 2, true),
            record(30, 300, 5, true),
        ];
        let rows = latest_rows(&records, 20);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].option_id, 200);
        assert_eq!(rows[0].revision, 2);

        assert!(latest_rows(&records, 99).is_empty());
    }

    #[test]
    fn labels_follow_catalog_order() {
        let options = vec![option(201, 0), option(200, 1), option(202, 0)];
        let chosen = BTreeSet::from([200, 202]);
        let views = label_options(&options, &chosen);

        let labels: Vec<&str> = views.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(labels, vec!["A0", "A1", "A2"]);
        // label A0 belongs to option 201: first in catalog order, not by id
        assert!(!views[0].chosen);
        assert!(views[1].chosen && views[1].correct);
        assert!(views[2].chosen && !views[2].correct);
    }
}
