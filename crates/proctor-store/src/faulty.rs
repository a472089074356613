//! Fault-injecting store decorator for tests.
//!
//! Wraps any `AttemptStore` and injects a configurable number of leading
//! insert conflicts and/or a fixed latency before every call, so the
//! engine's retry loop and bounded deadlines can be exercised without a
//! real contended store.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use proctor_core::error::EngineError;
use proctor_core::model::{AnswerRecord, Attempt, NewAnswerRecord, NewAttempt};
use proctor_core::traits::AttemptStore;

/// Decorator over an `AttemptStore` that misbehaves on demand.
pub struct FaultyStore {
    inner: Arc<dyn AttemptStore>,
    /// Remaining `insert_attempt` calls to fail with a conflict.
    insert_conflicts: AtomicU32,
    /// Latency applied before every delegated call.
    latency: Option<Duration>,
    /// Number of calls made, across all methods.
    calls: AtomicU32,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn AttemptStore>) -> Self {
        Self {
            inner,
            insert_conflicts: AtomicU32::new(0),
            latency: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Fail the next `n` attempt inserts with a retriable conflict.
    pub fn with_insert_conflicts(mut self, n: u32) -> Self {
        self.insert_conflicts = AtomicU32::new(n);
        self
    }

    /// Sleep this long before every delegated call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of store calls made so far.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    async fn observe(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl AttemptStore for FaultyStore {
    async fn attempt(&self, attempt_id: i64) -> Result<Option<Attempt>, EngineError> {
        self.observe().await;
        self.inner.attempt(attempt_id).await
    }

    async fn open_attempts(
        &self,
        user_id: i64,
        exam_id: i64,
    ) -> Result<Vec<Attempt>, EngineError> {
        self.observe().await;
        self.inner.open_attempts(user_id, exam_id).await
    }

    async fn finished_attempts(
        &self,
        user_id: i64,
        exam_id: i64,
    ) -> Result<Vec<Attempt>, EngineError> {
        self.observe().await;
        self.inner.finished_attempts(user_id, exam_id).await
    }

    async fn insert_attempt(&self, new: NewAttempt) -> Result<Attempt, EngineError> {
        self.observe().await;
        if self
            .insert_conflicts
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(EngineError::Conflict("injected insert conflict".into()));
        }
        self.inner.insert_attempt(new).await
    }

    async fn update_attempt(&self, attempt: &Attempt) -> Result<(), EngineError> {
        self.observe().await;
        self.inner.update_attempt(attempt).await
    }

    async fn insert_answer(&self, new: NewAnswerRecord) -> Result<AnswerRecord, EngineError> {
        self.observe().await;
        self.inner.insert_answer(new).await
    }

    async fn answers_for_attempt(
        &self,
        attempt_id: i64,
    ) -> Result<Vec<AnswerRecord>, EngineError> {
        self.observe().await;
        self.inner.answers_for_attempt(attempt_id).await
    }

    async fn answers_for_question(
        &self,
        attempt_id: i64,
        question_id: i64,
    ) -> Result<Vec<AnswerRecord>, EngineError> {
        self.observe().await;
        self.inner.answers_for_question(attempt_id, question_id).await
    }
}
