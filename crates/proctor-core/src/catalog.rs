//! TOML exam catalog parser.
//!
//! Loads one exam with its questions and options from a TOML file, and
//! validates the correct-option structure. Used by tests and by
//! single-process deployments to seed an in-memory catalog.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::Deserialize;

use crate::model::{ChoiceOption, Exam, ExamStatus, Question, QuestionKind};

/// One exam definition with its questions in catalog order.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub exam: Exam,
    pub questions: Vec<CatalogQuestion>,
}

/// A question with its options in catalog order.
#[derive(Debug, Clone)]
pub struct CatalogQuestion {
    pub question: Question,
    pub options: Vec<ChoiceOption>,
}

/// Intermediate TOML structure for parsing catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    exam: TomlExamHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlExamHeader {
    id: i64,
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_status")]
    status: String,
    #[serde(default)]
    time_limit_secs: Option<u32>,
}

fn default_true() -> bool {
    true
}

fn default_status() -> String {
    "active".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: i64,
    name: String,
    kind: String,
    #[serde(default)]
    options: Vec<TomlOption>,
}

#[derive(Debug, Deserialize)]
struct TomlOption {
    id: i64,
    content: String,
    #[serde(default)]
    weight: u8,
}

/// Parse a single TOML file into a `Catalog`.
pub fn parse_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    parse_catalog_str(&content, path)
}

/// Parse a TOML string into a `Catalog` (useful for testing).
pub fn parse_catalog_str(content: &str, source_path: &Path) -> Result<Catalog> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let status = match parsed.exam.status.to_lowercase().as_str() {
        "active" => ExamStatus::Active,
        "retired" => ExamStatus::Retired,
        other => bail!("exam {}: unknown status '{other}'", parsed.exam.id),
    };

    let exam = Exam {
        id: parsed.exam.id,
        name: parsed.exam.name,
        category: parsed.exam.category,
        enabled: parsed.exam.enabled,
        status,
        time_limit_secs: parsed.exam.time_limit_secs,
        created_at: Utc::now(),
    };

    let mut question_ids = HashSet::new();
    let mut option_ids = HashSet::new();
    let mut questions = Vec::with_capacity(parsed.questions.len());

    for q in parsed.questions {
        if !question_ids.insert(q.id) {
            bail!("duplicate question id {}", q.id);
        }
        let kind: QuestionKind = q
            .kind
            .parse()
            .map_err(|e: String| anyhow::anyhow!("question {}: {e}", q.id))?;

        if q.options.is_empty() {
            bail!("question {} has no options", q.id);
        }

        let mut options = Vec::with_capacity(q.options.len());
        let mut correct_count = 0usize;
        for o in q.options {
            if !option_ids.insert(o.id) {
                bail!("duplicate option id {}", o.id);
            }
            if o.weight > 1 {
                bail!(
                    "option {}: weight {} is not 0 or 1 (partial credit is unsupported)",
                    o.id,
                    o.weight
                );
            }
            if o.weight == 1 {
                correct_count += 1;
            }
            options.push(ChoiceOption {
                id: o.id,
                question_id: q.id,
                content: o.content,
                weight: o.weight,
            });
        }

        match kind {
            QuestionKind::Single if correct_count != 1 => bail!(
                "single-choice question {} must have exactly one correct option, found {}",
                q.id,
                correct_count
            ),
            QuestionKind::Multi if correct_count == 0 => {
                bail!("multi-choice question {} has no correct option", q.id)
            }
            _ => {}
        }

        questions.push(CatalogQuestion {
            question: Question {
                id: q.id,
                exam_id: exam.id,
                name: q.name,
                kind,
            },
            options,
        });
    }

    Ok(Catalog { exam, questions })
}
