//! In-memory attempt store.
//!
//! A transactional record store for single-process deployments and tests.
//! Every mutation runs under one table lock, so each call is atomic; the
//! one-open-attempt unique constraint is checked inside the insert, which
//! is what makes a lost create race surface as a conflict.

use std::sync::Mutex;

use async_trait::async_trait;

use proctor_core::error::EngineError;
use proctor_core::model::{AnswerRecord, Attempt, NewAnswerRecord, NewAttempt};
use proctor_core::traits::AttemptStore;

#[derive(Default)]
struct Tables {
    attempts: Vec<Attempt>,
    answers: Vec<AnswerRecord>,
    next_attempt_id: i64,
    next_answer_id: i64,
}

/// In-memory `AttemptStore` with monotonic id sequences.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AttemptStore for MemoryStore {
    async fn attempt(&self, attempt_id: i64) -> Result<Option<Attempt>, EngineError> {
        let tables = self.lock();
        Ok(tables.attempts.iter().find(|a| a.id == attempt_id).cloned())
    }

    async fn open_attempts(
        &self,
        user_id: i64,
        exam_id: i64,
    ) -> Result<Vec<Attempt>, EngineError> {
        let tables = self.lock();
        Ok(tables
            .attempts
            .iter()
            .filter(|a| a.user_id == user_id && a.exam_id == exam_id && !a.is_finished())
            .cloned()
            .collect())
    }

    async fn finished_attempts(
        &self,
        user_id: i64,
        exam_id: i64,
    ) -> Result<Vec<Attempt>, EngineError> {
        let tables = self.lock();
        Ok(tables
            .attempts
            .iter()
            .filter(|a| a.user_id == user_id && a.exam_id == exam_id && a.is_finished())
            .cloned()
            .collect())
    }

    async fn insert_attempt(&self, new: NewAttempt) -> Result<Attempt, EngineError> {
        let mut tables = self.lock();

        // unique constraint: one open attempt per (user, exam)
        if tables
            .attempts
            .iter()
            .any(|a| a.user_id == new.user_id && a.exam_id == new.exam_id && !a.is_finished())
        {
            return Err(EngineError::Conflict(format!(
                "open attempt already exists for user {} exam {}",
                new.user_id, new.exam_id
            )));
        }

        tables.next_attempt_id += 1;
        let attempt = Attempt {
            id: tables.next_attempt_id,
            user_id: new.user_id,
            exam_id: new.exam_id,
            page_no: new.page_no,
            score: new.score,
            started_at: new.started_at,
            finished_at: None,
        };
        tables.attempts.push(attempt.clone());
        Ok(attempt)
    }

    async fn update_attempt(&self, attempt: &Attempt) -> Result<(), EngineError> {
        let mut tables = self.lock();
        let stored = tables
            .attempts
            .iter_mut()
            .find(|a| a.id == attempt.id)
            .ok_or_else(|| EngineError::not_found("attempt", attempt.id))?;

        // terminal-state backstop: finished rows never change
        if stored.is_finished() {
            return Err(EngineError::Conflict(format!(
                "attempt {} is already finished",
                attempt.id
            )));
        }

        *stored = attempt.clone();
        Ok(())
    }

    async fn insert_answer(&self, new: NewAnswerRecord) -> Result<AnswerRecord, EngineError> {
        let mut tables = self.lock();
        tables.next_answer_id += 1;
        let record = AnswerRecord {
            id: tables.next_answer_id,
            attempt_id: new.attempt_id,
            question_id: new.question_id,
            option_id: new.option_id,
            multi_choice: new.multi_choice,
            correct: new.correct,
            revision: new.revision,
            created_at: new.created_at,
        };
        tables.answers.push(record.clone());
        Ok(record)
    }

    async fn answers_for_attempt(
        &self,
        attempt_id: i64,
    ) -> Result<Vec<AnswerRecord>, EngineError> {
        let tables = self.lock();
        Ok(tables
            .answers
            .iter()
            .filter(|r| r.attempt_id == attempt_id)
            .cloned()
            .collect())
    }

    async fn answers_for_question(
        &self,
        attempt_id: i64,
        question_id: i64,
    ) -> Result<Vec<AnswerRecord>, EngineError> {
        let tables = self.lock();
        Ok(tables
            .answers
            .iter()
            .filter(|r| r.attempt_id == attempt_id && r.question_id == question_id)
            .cloned()
            .collect())
    }
}
