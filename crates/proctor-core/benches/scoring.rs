use criterion::{black_box, criterion_group, criterion_main, Criterion};

use proctor_core::model::{ChoiceOption, Question, QuestionKind};
use proctor_core::scoring::{score_multi_choice, score_single_choice};

fn make_question(kind: QuestionKind) -> Question {
    Question {
        id: 1,
        exam_id: 1,
        name: "bench".into(),
        kind,
    }
}

fn make_options(total: usize, correct: usize) -> Vec<ChoiceOption> {
    (0..total)
        .map(|i| ChoiceOption {
            id: i as i64,
            question_id: 1,
            content: format!("option {i}"),
            weight: u8::from(i < correct),
        })
        .collect()
}

fn bench_single_choice(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_single_choice");
    let question = make_question(QuestionKind::Single);

    for total in [4usize, 16, 64] {
        let options = make_options(total, 1);
        group.bench_function(format!("options={total}"), |b| {
            b.iter(|| {
                score_single_choice(
                    black_box(&question),
                    black_box(&options),
                    black_box((total - 1) as i64),
                )
            })
        });
    }

    group.finish();
}

fn bench_multi_choice(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_multi_choice");
    let question = make_question(QuestionKind::Multi);

    for (total, correct) in [(4usize, 2usize), (16, 8), (64, 32)] {
        let options = make_options(total, correct);
        let chosen: Vec<i64> = (0..correct as i64).rev().collect();
        group.bench_function(format!("options={total},chosen={correct}"), |b| {
            b.iter(|| {
                score_multi_choice(black_box(&question), black_box(&options), black_box(&chosen))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_choice, bench_multi_choice);
criterion_main!(benches);
