//! Review flows over finished attempts: aggregation, analysis, and the
//! record round-trip property.

use std::path::Path;
use std::sync::Arc;

use proctor_core::catalog::parse_catalog_str;
use proctor_core::engine::{EngineConfig, SessionEngine};
use proctor_core::error::EngineError;
use proctor_report::{AttemptAnalyzer, ResultSummarizer, ReviewConfig};
use proctor_store::{MemoryCatalog, MemoryStore};

const CATALOG: &str = r#"
[exam]
id = 1
name = "Rust onboarding"
category = "onboarding"

[[questions]]
id = 10
name = "Is it memory safe?"
kind = "single"

[[questions.options]]
id = 100
content = "yes"
weight = 1

[[questions.options]]
id = 101
content = "no"

[[questions]]
id = 20
name = "Pick the keywords"
kind = "multi"

[[questions.options]]
id = 200
content = "fn"
weight = 1

[[questions.options]]
id = 201
content = "let"
weight = 1

[[questions.options]]
id = 202
content = "def"

[[questions]]
id = 30
name = "Does it have a GC?"
kind = "single"

[[questions.options]]
id = 300
content = "no"
weight = 1

[[questions.options]]
id = 301
content = "yes"
"#;

struct Review {
    engine: SessionEngine,
    summarizer: ResultSummarizer,
    analyzer: AttemptAnalyzer,
    catalog: Arc<MemoryCatalog>,
}

fn fixture() -> Review {
    let store = Arc::new(MemoryStore::new());
    let catalog = Arc::new(MemoryCatalog::from_catalog(
        parse_catalog_str(CATALOG, Path::new("review.toml")).unwrap(),
    ));
    Review {
        engine: SessionEngine::new(store.clone(), catalog.clone(), EngineConfig::default()),
        summarizer: ResultSummarizer::new(store.clone(), ReviewConfig::default()),
        analyzer: AttemptAnalyzer::new(store, catalog.clone(), ReviewConfig::default()),
        catalog,
    }
}

/// Page through the whole exam: q10 and q30 single-choice, q20 the
/// multi-choice set. Returns the finished attempt id.
async fn complete_attempt(
    review: &Review,
    user_id: i64,
    q10_option: i64,
    q20_options: &[i64],
    q30_option: i64,
) -> i64 {
    review
        .engine
        .submit_single_choice(user_id, 1, 10, q10_option, 1)
        .await
        .unwrap();
    review
        .engine
        .submit_multi_choice(user_id, 1, 20, q20_options, 2)
        .await
        .unwrap();
    let last = review
        .engine
        .submit_single_choice(user_id, 1, 30, q30_option, 3)
        .await
        .unwrap();
    assert!(last.finished);
    last.attempt.id
}

#[tokio::test]
async fn verdicts_round_trip_from_the_records_alone() {
    let review = fixture();
    let attempt_id = complete_attempt(&review, 7, 100, &[200, 201], 301).await;

    let verdicts = review.analyzer.question_analysis(attempt_id).await.unwrap();
    let by_question: Vec<(i64, bool)> =
        verdicts.iter().map(|v| (v.question_id, v.correct)).collect();
    // same verdicts the scoring engine produced at submission time,
    // rebuilt without consulting the attempt's cached score
    assert_eq!(by_question, vec![(10, true), (20, true), (30, false)]);

    let summary = review.summarizer.summarize(7, 1).await.unwrap().unwrap();
    let reconstructed = verdicts.iter().filter(|v| v.correct).count() as u32;
    assert_eq!(summary.recent.right, reconstructed);
}

#[tokio::test]
async fn a_strict_subset_is_wrong_only_for_the_attempt_that_chose_it() {
    let review = fixture();
    let exact = complete_attempt(&review, 7, 100, &[200, 201], 300).await;
    let subset = complete_attempt(&review, 8, 100, &[200], 300).await;

    let exact_verdicts = review.analyzer.question_analysis(exact).await.unwrap();
    assert!(exact_verdicts[1].correct);

    let subset_verdicts = review.analyzer.question_analysis(subset).await.unwrap();
    assert!(!subset_verdicts[1].correct);
}

#[tokio::test]
async fn skipped_questions_report_incorrect() {
    let review = fixture();
    // straight to the last page: q20 never answered
    review
        .engine
        .submit_single_choice(7, 1, 10, 100, 1)
        .await
        .unwrap();
    let last = review
        .engine
        .submit_single_choice(7, 1, 30, 300, 3)
        .await
        .unwrap();
    assert!(last.finished);

    let verdicts = review
        .analyzer
        .question_analysis(last.attempt.id)
        .await
        .unwrap();
    assert_eq!(verdicts[1], proctor_report::QuestionVerdict {
        question_id: 20,
        correct: false,
    });
}

#[tokio::test]
async fn catalog_corrections_recompute_multi_but_not_single_verdicts() {
    let review = fixture();
    let attempt_id = complete_attempt(&review, 7, 100, &[200, 201], 301).await;

    // correction lands after the attempt finished: "def" is now also correct
    assert!(review.catalog.set_option_weight(202, 1));
    // and the single-choice answer key flips entirely
    assert!(review.catalog.set_option_weight(100, 0));
    assert!(review.catalog.set_option_weight(101, 1));

    let verdicts = review.analyzer.question_analysis(attempt_id).await.unwrap();
    // multi-choice recomputes against the corrected set and flips
    assert!(!verdicts[1].correct);
    // single-choice keeps the flag stored at submission time
    assert!(verdicts[0].correct);
}

#[tokio::test]
async fn option_analysis_labels_in_catalog_order() {
    let review = fixture();
    let attempt_id = complete_attempt(&review, 7, 100, &[200, 202], 300).await;

    let analysis = review
        .analyzer
        .option_analysis(attempt_id, 20)
        .await
        .unwrap();

    assert_eq!(analysis.question_name, "Pick the keywords");
    let views: Vec<(&str, &str, bool, bool)> = analysis
        .options
        .iter()
        .map(|o| (o.label.as_str(), o.content.as_str(), o.correct, o.chosen))
        .collect();
    assert_eq!(
        views,
        vec![
            ("A0", "fn", true, true),
            ("A1", "let", true, false),
            ("A2", "def", false, true),
        ]
    );
    assert_eq!(analysis.chosen_labels, vec!["A0", "A2"]);
}

#[tokio::test]
async fn resubmissions_are_reviewed_at_their_latest_revision() {
    let review = fixture();
    review
        .engine
        .submit_multi_choice(7, 1, 20, &[200, 201], 1)
        .await
        .unwrap();
    // changed their mind before moving on
    let outcome = review
        .engine
        .submit_multi_choice(7, 1, 20, &[200, 202], 1)
        .await
        .unwrap();

    let analysis = review
        .analyzer
        .option_analysis(outcome.attempt.id, 20)
        .await
        .unwrap();
    assert_eq!(analysis.chosen_labels, vec!["A0", "A2"]);
}

#[tokio::test]
async fn summaries_order_attempts_most_recent_first() {
    let review = fixture();
    let first = complete_attempt(&review, 7, 100, &[200, 201], 300).await;
    let second = complete_attempt(&review, 7, 101, &[200], 301).await;

    let results = review.summarizer.summarize(7, 1).await.unwrap().unwrap();
    assert_eq!(results.recent.attempt_id, second);
    assert_eq!(results.recent.right, 0);
    assert_eq!(results.recent.wrong, 3);

    let ids: Vec<i64> = results.history.iter().map(|s| s.attempt_id).collect();
    assert_eq!(ids, vec![second, first]);
    assert_eq!(results.history[1].right, 3);
    assert_eq!(results.history[1].wrong, 0);

    let history = review.summarizer.history(7, 1).await.unwrap();
    assert_eq!(history, results.history);
}

#[tokio::test]
async fn no_finished_attempt_is_no_data_not_an_error() {
    let review = fixture();
    assert!(review.summarizer.summarize(7, 1).await.unwrap().is_none());

    // an open attempt is still no data for the aggregator
    review
        .engine
        .submit_single_choice(7, 1, 10, 100, 1)
        .await
        .unwrap();
    assert!(review.summarizer.summarize(7, 1).await.unwrap().is_none());
    assert!(review.summarizer.history(7, 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_attempts_and_foreign_questions_are_not_found() {
    let review = fixture();
    let attempt_id = complete_attempt(&review, 7, 100, &[200], 300).await;

    let err = review.analyzer.question_analysis(404).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound { kind: "attempt", id: 404 }));

    let err = review
        .analyzer
        .option_analysis(attempt_id, 999)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { kind: "question", id: 999 }));
}
