//! Collaborator traits for persistence and catalog access.
//!
//! These async traits are implemented by the `proctor-store` crate (and by
//! any production record store). The engine and the review paths are
//! written against them so every component takes test doubles.

use async_trait::async_trait;

use crate::error::EngineError;
use crate::model::{
    AnswerRecord, Attempt, ChoiceOption, Exam, NewAnswerRecord, NewAttempt, Question,
};

// ---------------------------------------------------------------------------
// Attempt store
// ---------------------------------------------------------------------------

/// Transactional record store for attempts and answer records.
///
/// Implementations must enforce the one-open-attempt unique constraint on
/// insert and reject mutation of finished attempts; both violations surface
/// as [`EngineError::Conflict`] so the tracker can retry.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Fetch one attempt by id.
    async fn attempt(&self, attempt_id: i64) -> Result<Option<Attempt>, EngineError>;

    /// All open (null completion timestamp) attempts for a (user, exam)
    /// pair. A correct store returns zero or one; the tracker treats more
    /// as an invariant violation.
    async fn open_attempts(&self, user_id: i64, exam_id: i64)
        -> Result<Vec<Attempt>, EngineError>;

    /// All finished attempts for a (user, exam) pair, in unspecified order.
    /// Callers sort explicitly.
    async fn finished_attempts(
        &self,
        user_id: i64,
        exam_id: i64,
    ) -> Result<Vec<Attempt>, EngineError>;

    /// Insert a new attempt. Fails with `Conflict` if an open attempt
    /// already exists for the pair.
    async fn insert_attempt(&self, new: NewAttempt) -> Result<Attempt, EngineError>;

    /// Persist a mutated attempt. Fails with `Conflict` if the stored row
    /// is already finished.
    async fn update_attempt(&self, attempt: &Attempt) -> Result<(), EngineError>;

    /// Append one answer record. Records are never updated or deleted.
    async fn insert_answer(&self, new: NewAnswerRecord) -> Result<AnswerRecord, EngineError>;

    /// All answer records for an attempt, ordered by insertion.
    async fn answers_for_attempt(
        &self,
        attempt_id: i64,
    ) -> Result<Vec<AnswerRecord>, EngineError>;

    /// All answer records for one question within an attempt, ordered by
    /// insertion.
    async fn answers_for_question(
        &self,
        attempt_id: i64,
        question_id: i64,
    ) -> Result<Vec<AnswerRecord>, EngineError>;
}

// ---------------------------------------------------------------------------
// Catalog reader
// ---------------------------------------------------------------------------

/// Read-only access to exam/question/option definitions.
///
/// The catalog is owned by administration tooling outside this subsystem
/// and is assumed consistent for the duration of a submission.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Fetch one exam by id.
    async fn exam(&self, exam_id: i64) -> Result<Option<Exam>, EngineError>;

    /// Questions of an exam in catalog order.
    async fn questions(&self, exam_id: i64) -> Result<Vec<Question>, EngineError>;

    /// Fetch one question by id.
    async fn question(&self, question_id: i64) -> Result<Option<Question>, EngineError>;

    /// Options of a question in catalog order.
    async fn options(&self, question_id: i64) -> Result<Vec<ChoiceOption>, EngineError>;

    /// Fetch one option by id.
    async fn option(&self, option_id: i64) -> Result<Option<ChoiceOption>, EngineError>;
}
