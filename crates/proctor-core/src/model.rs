//! Core data model types for proctor.
//!
//! These are the fundamental records that the attempt engine, the stores,
//! and the review paths all share: catalog entities (exam, question,
//! option), the per-user attempt, and the append-only answer record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An exam definition. Owned by catalog administration; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    /// Unique exam identifier.
    pub id: i64,
    /// Human-readable exam name.
    pub name: String,
    /// Category/type label (e.g. "onboarding").
    pub category: String,
    /// Whether the exam currently accepts submissions.
    pub enabled: bool,
    /// Lifecycle status.
    pub status: ExamStatus,
    /// Optional per-attempt time limit in seconds. `None` means untimed.
    #[serde(default)]
    pub time_limit_secs: Option<u32>,
    /// When the exam was published.
    pub created_at: DateTime<Utc>,
}

/// Exam lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    Active,
    Retired,
}

/// Question kind: one correct option, or a correct option set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Single,
    Multi,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::Single => write!(f, "single"),
            QuestionKind::Multi => write!(f, "multi"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" | "single-choice" => Ok(QuestionKind::Single),
            "multi" | "multi-choice" | "multiple" => Ok(QuestionKind::Multi),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

/// A question belonging to exactly one exam.
///
/// Questions are ordered by catalog definition, not by attempt page number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique question identifier.
    pub id: i64,
    /// Owning exam.
    pub exam_id: i64,
    /// Question text.
    pub name: String,
    /// Single- or multi-choice.
    pub kind: QuestionKind,
}

/// An answer option belonging to exactly one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Unique option identifier.
    pub id: i64,
    /// Owning question.
    pub question_id: i64,
    /// Option text.
    pub content: String,
    /// Correctness weight: 1 marks the correct option, 0 a distractor.
    /// Weights outside {0, 1} are rejected at catalog load.
    pub weight: u8,
}

impl ChoiceOption {
    /// Whether this option is a correct answer (weight == 1).
    pub fn is_correct(&self) -> bool {
        self.weight == 1
    }
}

/// One in-progress or completed pass of a user through an exam.
///
/// At most one attempt per (user, exam) pair may be open (null
/// `finished_at`) at any time. An attempt becomes immutable once
/// `finished_at` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    /// Unique attempt identifier (monotonic sequence; "most recent" ties
    /// break on this).
    pub id: i64,
    /// The examinee.
    pub user_id: i64,
    /// The exam being taken.
    pub exam_id: i64,
    /// Current page number, 1-based, advances monotonically.
    pub page_no: u32,
    /// Cumulative score.
    pub score: u32,
    /// When the attempt was opened.
    pub started_at: DateTime<Utc>,
    /// Completion timestamp; `None` means in progress.
    pub finished_at: Option<DateTime<Utc>>,
}

impl Attempt {
    /// Whether the attempt has reached its terminal state.
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

/// Insert payload for a new attempt.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub user_id: i64,
    pub exam_id: i64,
    pub page_no: u32,
    pub score: u32,
    pub started_at: DateTime<Utc>,
}

/// Immutable record of one option selection within an attempt.
///
/// Append-only: re-submissions append records under a fresh `revision`
/// rather than touching history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Unique record identifier.
    pub id: i64,
    /// Owning attempt.
    pub attempt_id: i64,
    /// The question answered.
    pub question_id: i64,
    /// The option selected.
    pub option_id: i64,
    /// Whether this selection was part of a multi-choice submission.
    pub multi_choice: bool,
    /// Per-option correctness computed at write time.
    pub correct: bool,
    /// Submission generation for this (attempt, question) pair, 1-based.
    pub revision: u32,
    /// When the selection was recorded.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new answer record.
#[derive(Debug, Clone)]
pub struct NewAnswerRecord {
    pub attempt_id: i64,
    pub question_id: i64,
    pub option_id: i64,
    pub multi_choice: bool,
    pub correct: bool,
    pub revision: u32,
    pub created_at: DateTime<Utc>,
}

/// What a submission did to the attempt.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    /// The attempt after the submission was applied.
    pub attempt: Attempt,
    /// Score contribution of this submission (0 or 1).
    pub delta: u32,
    /// Whether the answer was correct.
    pub correct: bool,
    /// Whether this submission finished the attempt.
    pub finished: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_kind_display_and_parse() {
        assert_eq!(QuestionKind::Single.to_string(), "single");
        assert_eq!(QuestionKind::Multi.to_string(), "multi");
        assert_eq!("single".parse::<QuestionKind>().unwrap(), QuestionKind::Single);
        assert_eq!(
            "multi-choice".parse::<QuestionKind>().unwrap(),
            QuestionKind::Multi
        );
        assert_eq!("Multiple".parse::<QuestionKind>().unwrap(), QuestionKind::Multi);
        assert!("essay".parse::<QuestionKind>().is_err());
    }

    #[test]
    fn option_correctness_follows_weight() {
        let opt = ChoiceOption {
            id: 1,
            question_id: 1,
            content: "yes".into(),
            weight: 1,
        };
        assert!(opt.is_correct());
        let opt = ChoiceOption { weight: 0, ..opt };
        assert!(!opt.is_correct());
    }

    #[test]
    fn attempt_finished_tracks_timestamp() {
        let mut attempt = Attempt {
            id: 1,
            user_id: 7,
            exam_id: 3,
            page_no: 1,
            score: 0,
            started_at: Utc::now(),
            finished_at: None,
        };
        assert!(!attempt.is_finished());
        attempt.finished_at = Some(Utc::now());
        assert!(attempt.is_finished());
    }

    #[test]
    fn attempt_serde_roundtrip() {
        let attempt = Attempt {
            id: 42,
            user_id: 7,
            exam_id: 3,
            page_no: 5,
            score: 4,
            started_at: Utc::now(),
            finished_at: None,
        };
        let json = serde_json::to_string(&attempt).unwrap();
        let back: Attempt = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, 42);
        assert_eq!(back.page_no, 5);
        assert!(back.finished_at.is_none());
    }
}
