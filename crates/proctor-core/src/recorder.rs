//! Answer record planning.
//!
//! Turns a scored submission into the append-only rows the store persists:
//! one row per chosen option, each tagged with its own correctness (not the
//! aggregate question verdict) and the next revision for the
//! (attempt, question) pair.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::error::EngineError;
use crate::model::{AnswerRecord, ChoiceOption, NewAnswerRecord, Question, QuestionKind};

/// The revision the next submission for this (attempt, question) pair
/// should carry: one past the highest recorded so far.
pub fn next_revision(existing: &[AnswerRecord]) -> u32 {
    existing.iter().map(|r| r.revision).max().unwrap_or(0) + 1
}

/// Plan the rows for one submission. Duplicate option ids collapse so each
/// option yields exactly one row.
///
/// Fails with `NotFound` if a chosen option does not belong to the
/// question; the recorder never writes rows it cannot attribute.
pub fn plan_answer_rows(
    attempt_id: i64,
    question: &Question,
    options: &[ChoiceOption],
    chosen_option_ids: &[i64],
    revision: u32,
    recorded_at: DateTime<Utc>,
) -> Result<Vec<NewAnswerRecord>, EngineError> {
    let multi_choice = question.kind == QuestionKind::Multi;
    let chosen: BTreeSet<i64> = chosen_option_ids.iter().copied().collect();

    let mut rows = Vec::with_capacity(chosen.len());
    for option_id in chosen {
        let option = options
            .iter()
            .find(|o| o.id == option_id)
            .ok_or_else(|| EngineError::not_found("option", option_id))?;
        rows.push(NewAnswerRecord {
            attempt_id,
            question_id: question.id,
            option_id,
            multi_choice,
            correct: option.is_correct(),
            revision,
            created_at: recorded_at,
        });
    }
    Ok(rows)
}
