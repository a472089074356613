//! Attempt session engine.
//!
//! Orchestrates one submission end to end: resolve or create the open
//! attempt for the (user, exam) pair, score the answer, advance the page,
//! detect completion, and append the answer records. Mutations are
//! serialized per pair and collaborator calls carry bounded deadlines.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;

use crate::error::EngineError;
use crate::model::{
    Attempt, AnswerRecord, ChoiceOption, Exam, ExamStatus, NewAttempt, Question, QuestionKind,
    SubmissionOutcome,
};
use crate::recorder;
use crate::scoring::{self, Scored};
use crate::traits::{AttemptStore, CatalogReader};

/// Configuration for the session engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Retries after a retriable conflict while resolving the attempt.
    pub max_conflict_retries: u32,
    /// Initial delay between conflict retries; doubles per retry.
    pub retry_delay: Duration,
    /// Deadline applied to every collaborator call.
    pub store_deadline: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
            retry_delay: Duration::from_millis(50),
            store_deadline: Duration::from_secs(5),
        }
    }
}

/// The attempt state machine and scoring engine.
///
/// Collaborators are constructor-injected so tests run against in-process
/// doubles and production runs against a real record store.
pub struct SessionEngine {
    store: Arc<dyn AttemptStore>,
    catalog: Arc<dyn CatalogReader>,
    config: EngineConfig,
    /// One lock per (user, exam) pair; entries are never evicted.
    pair_locks: Mutex<HashMap<(i64, i64), Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionEngine {
    pub fn new(
        store: Arc<dyn AttemptStore>,
        catalog: Arc<dyn CatalogReader>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            config,
            pair_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Find the unique open attempt for the pair, creating one at page 1
    /// with score 0 if none exists.
    pub async fn resolve_attempt(
        &self,
        user_id: i64,
        exam_id: i64,
    ) -> Result<Attempt, EngineError> {
        let lock = self.pair_lock(user_id, exam_id);
        let _guard = lock.lock().await;
        self.resolve_locked(user_id, exam_id).await
    }

    /// Submit a single-choice answer.
    pub async fn submit_single_choice(
        &self,
        user_id: i64,
        exam_id: i64,
        question_id: i64,
        option_id: i64,
        page_no: u32,
    ) -> Result<SubmissionOutcome, EngineError> {
        self.submit(
            user_id,
            exam_id,
            question_id,
            &[option_id],
            QuestionKind::Single,
            page_no,
        )
        .await
    }

    /// Submit a multi-choice answer: the chosen set is compared against the
    /// correct-option set as a whole.
    pub async fn submit_multi_choice(
        &self,
        user_id: i64,
        exam_id: i64,
        question_id: i64,
        option_ids: &[i64],
        page_no: u32,
    ) -> Result<SubmissionOutcome, EngineError> {
        self.submit(
            user_id,
            exam_id,
            question_id,
            option_ids,
            QuestionKind::Multi,
            page_no,
        )
        .await
    }

    async fn submit(
        &self,
        user_id: i64,
        exam_id: i64,
        question_id: i64,
        chosen_option_ids: &[i64],
        kind: QuestionKind,
        page_no: u32,
    ) -> Result<SubmissionOutcome, EngineError> {
        if page_no == 0 {
            return Err(EngineError::Validation("page number must be >= 1".into()));
        }

        // Catalog reads take no locks; the catalog is consistent for the
        // duration of a submission.
        let exam = self
            .bounded(self.catalog.exam(exam_id))
            .await?
            .ok_or_else(|| EngineError::not_found("exam", exam_id))?;
        ensure_accepting(&exam)?;

        let question = self
            .bounded(self.catalog.question(question_id))
            .await?
            .ok_or_else(|| EngineError::not_found("question", question_id))?;
        if question.exam_id != exam_id {
            return Err(EngineError::not_found("question", question_id));
        }

        let question_count = self.bounded(self.catalog.questions(exam_id)).await?.len() as u32;
        if page_no > question_count {
            return Err(EngineError::Validation(format!(
                "page {page_no} is beyond the exam's {question_count} questions"
            )));
        }

        let options = self.bounded(self.catalog.options(question_id)).await?;
        let scored = match kind {
            QuestionKind::Single => {
                scoring::score_single_choice(&question, &options, chosen_option_ids[0])?
            }
            QuestionKind::Multi => {
                scoring::score_multi_choice(&question, &options, chosen_option_ids)?
            }
        };

        // Mutations for the pair are serialized from here on.
        let lock = self.pair_lock(user_id, exam_id);
        let _guard = lock.lock().await;

        let mut attempt = self.resolve_locked(user_id, exam_id).await?;
        ensure_within_time_limit(&exam, &attempt, Utc::now())?;

        let prior = self
            .bounded(self.store.answers_for_question(attempt.id, question_id))
            .await?;
        let revision = recorder::next_revision(&prior);
        let prior_delta = prior_contribution(&prior, &question, &options);

        apply_submission(
            &mut attempt,
            page_no,
            scored,
            prior_delta,
            question_count,
            Utc::now(),
        )?;
        self.bounded(self.store.update_attempt(&attempt)).await?;

        if attempt.is_finished() {
            tracing::info!(user_id, exam_id, attempt_id = attempt.id, "attempt finished");
        }

        // Record inserts are independent once the attempt mutation has
        // committed; run them concurrently.
        let rows = recorder::plan_answer_rows(
            attempt.id,
            &question,
            &options,
            chosen_option_ids,
            revision,
            Utc::now(),
        )?;
        try_join_all(
            rows.into_iter()
                .map(|row| self.bounded(self.store.insert_answer(row))),
        )
        .await?;

        Ok(SubmissionOutcome {
            delta: scored.delta,
            correct: scored.correct,
            finished: attempt.is_finished(),
            attempt,
        })
    }

    /// Resolve-or-create with a bounded retry loop: a lost create race
    /// surfaces as a conflict, and re-resolving finds the winner's attempt.
    async fn resolve_locked(&self, user_id: i64, exam_id: i64) -> Result<Attempt, EngineError> {
        let mut last_error = None;
        let mut retry_delay = self.config.retry_delay;

        for retry in 0..=self.config.max_conflict_retries {
            if retry > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(Duration::from_secs(2));
            }
            match self.try_resolve(user_id, exam_id).await {
                Ok(attempt) => return Ok(attempt),
                Err(e @ EngineError::Conflict(_)) => {
                    tracing::warn!(user_id, exam_id, retry, "conflict resolving attempt: {e}");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| EngineError::Conflict("attempt resolution exhausted retries".into())))
    }

    async fn try_resolve(&self, user_id: i64, exam_id: i64) -> Result<Attempt, EngineError> {
        let open = self
            .bounded(self.store.open_attempts(user_id, exam_id))
            .await?;
        match open.as_slice() {
            [] => {
                tracing::info!(user_id, exam_id, "no open attempt, starting a new one");
                self.bounded(self.store.insert_attempt(NewAttempt {
                    user_id,
                    exam_id,
                    page_no: 1,
                    score: 0,
                    started_at: Utc::now(),
                }))
                .await
            }
            [attempt] => Ok(attempt.clone()),
            more => Err(EngineError::Conflict(format!(
                "{} open attempts for user {user_id} exam {exam_id}",
                more.len()
            ))),
        }
    }

    fn pair_lock(&self, user_id: i64, exam_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.pair_locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            locks
                .entry((user_id, exam_id))
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    /// Apply the configured deadline to a collaborator call.
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

fn ensure_accepting(exam: &Exam) -> Result<(), EngineError> {
    if !exam.enabled || exam.status != ExamStatus::Active {
        return Err(EngineError::Validation(format!(
            "exam {} is not accepting submissions",
            exam.id
        )));
    }
    Ok(())
}

fn ensure_within_time_limit(
    exam: &Exam,
    attempt: &Attempt,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    if let Some(limit) = exam.time_limit_secs {
        let deadline = attempt.started_at + chrono::Duration::seconds(i64::from(limit));
        if now > deadline {
            return Err(EngineError::Validation(format!(
                "attempt {} exceeded the exam time limit",
                attempt.id
            )));
        }
    }
    Ok(())
}

/// What the latest recorded submission for this question already
/// contributed to the attempt score. Single-choice reads the stored flag;
/// multi-choice recomputes set equality against the catalog, matching the
/// analysis engine's policy.
fn prior_contribution(
    prior: &[AnswerRecord],
    question: &Question,
    options: &[ChoiceOption],
) -> u32 {
    let Some(latest) = prior.iter().map(|r| r.revision).max() else {
        return 0;
    };
    let latest_rows = prior.iter().filter(|r| r.revision == latest);
    match question.kind {
        QuestionKind::Single => latest_rows
            .last()
            .map(|r| u32::from(r.correct))
            .unwrap_or(0),
        QuestionKind::Multi => {
            let chosen: BTreeSet<i64> = latest_rows.map(|r| r.option_id).collect();
            u32::from(chosen == scoring::correct_option_set(options))
        }
    }
}

/// Advance the attempt by one submission. The sole writer of completion
/// timestamps: the attempt finishes exactly when the page number reaches
/// the exam's question count.
///
/// A question's prior contribution is replaced, never stacked, so
/// re-submissions cannot double-count.
fn apply_submission(
    attempt: &mut Attempt,
    page_no: u32,
    scored: Scored,
    prior_delta: u32,
    question_count: u32,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    if attempt.is_finished() {
        return Err(EngineError::Conflict(format!(
            "attempt {} is already finished",
            attempt.id
        )));
    }
    if page_no < attempt.page_no {
        return Err(EngineError::Validation(format!(
            "out-of-order page: {page_no} < {}",
            attempt.page_no
        )));
    }

    attempt.page_no = page_no;
    attempt.score = attempt.score.saturating_sub(prior_delta) + scored.delta;
    if page_no == question_count {
        attempt.finished_at = Some(now);
    }
    Ok(())
}
