use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use foldwise_eval::roc::roc_auc;
use foldwise_eval::{
    AucEvaluator, CrossValidation, DenseProblem, FoldAssigner, LocalStatistics, NearestCentroid,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Two overlapping Gaussian-ish blobs, labels alternating.
fn blobs(n: usize, d: usize, seed: u64) -> DenseProblem {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut problem = DenseProblem::new(d);
    let mut row = vec![0.0; d];
    for i in 0..n {
        let (label, center) = if i % 2 == 0 { (1.0, 1.0) } else { (-1.0, 0.0) };
        for x in row.iter_mut() {
            *x = center + rng.gen_range(-1.0..1.0);
        }
        problem.add_instance(label, &row).unwrap();
    }
    problem
}

fn scored(n: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let labels: Vec<f64> = (0..n).map(|i| (i % 2) as f64).collect();
    let scores = labels.iter().map(|&l| l + rng.gen_range(-1.5..1.5)).collect();
    (scores, labels)
}

fn bench_fold_assignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("fold_assignment");

    let labels: Vec<f64> = (0..10_000).map(|i| if i % 5 == 0 { 1.0 } else { -1.0 }).collect();
    let assigner = FoldAssigner::default();

    group.bench_function("10k_k10", |b| {
        let mut rng = StdRng::seed_from_u64(42);
        b.iter(|| assigner.assign(black_box(&labels), 10, &mut rng))
    });

    group.finish();
}

fn bench_auc(c: &mut Criterion) {
    let mut group = c.benchmark_group("auc");

    let (scores, labels) = scored(10_000, 42);
    group.bench_function("roc_auc_10k", |b| {
        b.iter(|| roc_auc(black_box(&scores), black_box(&labels)))
    });

    let evaluator = AucEvaluator::new(Arc::new(LocalStatistics::default()));
    group.bench_function("evaluator_10k_3_measures", |b| {
        b.iter(|| {
            evaluator.evaluate_measures(black_box(&scores), black_box(&labels), &["auc", "mat", "acc"])
        })
    });

    group.finish();
}

fn bench_cross_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_validation");
    group.sample_size(20);

    let evaluator = AucEvaluator::new(Arc::new(LocalStatistics::default()));
    let cv = CrossValidation::new(NearestCentroid::new(8), blobs(1_000, 8, 42), evaluator)
        .with_measures(["auc"]);

    group.bench_function("1k_x8_k10_r3", |b| {
        let mut rng = StdRng::seed_from_u64(42);
        b.iter(|| cv.k_fold(10, 3, &mut rng))
    });

    group.finish();
}

criterion_group!(benches, bench_fold_assignment, bench_auc, bench_cross_validation);
criterion_main!(benches);
