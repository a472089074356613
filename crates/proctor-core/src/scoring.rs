//! Per-answer scoring.
//!
//! Pure functions over catalog data: no I/O, no clock. The engine feeds
//! these the question and its option list and applies the returned delta to
//! the attempt.

use std::collections::BTreeSet;

use crate::error::EngineError;
use crate::model::{ChoiceOption, Question, QuestionKind};

/// Score contribution of one answer submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scored {
    /// Points this answer adds to the attempt (0 or 1).
    pub delta: u32,
    /// Whether the answer was correct.
    pub correct: bool,
}

/// The set of option ids marked correct for a question.
pub fn correct_option_set(options: &[ChoiceOption]) -> BTreeSet<i64> {
    options
        .iter()
        .filter(|o| o.is_correct())
        .map(|o| o.id)
        .collect()
}

/// Score a single-choice answer: the chosen option's weight is the delta.
///
/// Fails with `Validation` if the question is not single-choice and
/// `NotFound` if the option does not belong to the question.
pub fn score_single_choice(
    question: &Question,
    options: &[ChoiceOption],
    chosen_option_id: i64,
) -> Result<Scored, EngineError> {
    if question.kind != QuestionKind::Single {
        return Err(EngineError::Validation(format!(
            "question {} is {}, expected single-choice",
            question.id, question.kind
        )));
    }

    let chosen = options
        .iter()
        .find(|o| o.id == chosen_option_id)
        .ok_or_else(|| EngineError::not_found("option", chosen_option_id))?;

    let delta = u32::from(chosen.weight);
    Ok(Scored {
        delta,
        correct: delta > 0,
    })
}

/// Score a multi-choice answer: correct iff the chosen set equals the
/// correct-option set. Order-independent; duplicate ids collapse.
///
/// Fails with `Validation` on a wrong question kind or an empty selection,
/// `NotFound` if any chosen option does not belong to the question.
pub fn score_multi_choice(
    question: &Question,
    options: &[ChoiceOption],
    chosen_option_ids: &[i64],
) -> Result<Scored, EngineError> {
    if question.kind != QuestionKind::Multi {
        return Err(EngineError::Validation(format!(
            "question {} is {}, expected multi-choice",
            question.id, question.kind
        )));
    }

    let chosen: BTreeSet<i64> = chosen_option_ids.iter().copied().collect();
    if chosen.is_empty() {
        return Err(EngineError::Validation(format!(
            "no options chosen for question {}",
            question.id
        )));
    }

    let known: BTreeSet<i64> = options.iter().map(|o| o.id).collect();
    if let Some(unknown) = chosen.iter().find(|id| !known.contains(id)) {
        return Err(EngineError::not_found("option", *unknown));
    }

    let correct = chosen == correct_option_set(options);
    Ok(Scored {
        delta: u32::from(correct),
        correct,
    })
}
