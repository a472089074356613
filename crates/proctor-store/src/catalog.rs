//! In-memory catalog reader.
//!
//! Serves exam/question/option definitions to the engine and the review
//! paths. Built from a parsed TOML [`Catalog`] or assembled directly.
//! Interior mutability exists so tests can apply a catalog correction and
//! observe how the analysis engine recomputes verdicts.

use std::sync::RwLock;

use async_trait::async_trait;

use proctor_core::catalog::Catalog;
use proctor_core::error::EngineError;
use proctor_core::model::{ChoiceOption, Exam, Question};
use proctor_core::traits::CatalogReader;

#[derive(Default)]
struct CatalogData {
    exams: Vec<Exam>,
    questions: Vec<Question>,
    options: Vec<ChoiceOption>,
}

/// In-memory `CatalogReader`. Catalog order is insertion order.
#[derive(Default)]
pub struct MemoryCatalog {
    data: RwLock<CatalogData>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from one parsed exam definition.
    pub fn from_catalog(catalog: Catalog) -> Self {
        let reader = Self::new();
        reader.load(catalog);
        reader
    }

    /// Load one parsed exam definition into the catalog.
    pub fn load(&self, catalog: Catalog) {
        let mut data = self.write();
        data.exams.push(catalog.exam);
        for entry in catalog.questions {
            data.questions.push(entry.question);
            data.options.extend(entry.options);
        }
    }

    /// Register one exam.
    pub fn add_exam(&self, exam: Exam) {
        self.write().exams.push(exam);
    }

    /// Register one question with its options, in catalog order.
    pub fn add_question(&self, question: Question, options: Vec<ChoiceOption>) {
        let mut data = self.write();
        data.questions.push(question);
        data.options.extend(options);
    }

    /// Catalog correction hook: flip an option's correctness weight.
    /// Returns `false` if the option is unknown.
    pub fn set_option_weight(&self, option_id: i64, weight: u8) -> bool {
        let mut data = self.write();
        match data.options.iter_mut().find(|o| o.id == option_id) {
            Some(option) => {
                option.weight = weight;
                true
            }
            None => false,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CatalogData> {
        self.data.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, CatalogData> {
        self.data.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CatalogReader for MemoryCatalog {
    async fn exam(&self, exam_id: i64) -> Result<Option<Exam>, EngineError> {
        Ok(self.read().exams.iter().find(|e| e.id == exam_id).cloned())
    }

    async fn questions(&self, exam_id: i64) -> Result<Vec<Question>, EngineError> {
        Ok(self
            .read()
            .questions
            .iter()
            .filter(|q| q.exam_id == exam_id)
            .cloned()
            .collect())
    }

    async fn question(&self, question_id: i64) -> Result<Option<Question>, EngineError> {
        Ok(self
            .read()
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .cloned())
    }

    async fn options(&self, question_id: i64) -> Result<Vec<ChoiceOption>, EngineError> {
        Ok(self
            .read()
            .options
            .iter()
            .filter(|o| o.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn option(&self, option_id: i64) -> Result<Option<ChoiceOption>, EngineError> {
        Ok(self
            .read()
            .options
            .iter()
            .find(|o| o.id == option_id)
            .cloned())
    }
}
