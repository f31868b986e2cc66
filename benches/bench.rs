//! Criterion benchmarks for classbench.
//!
//! Covers review cleaning, TF-IDF vectorization, single classifier fits
//! and the sequential versus parallel batch evaluation.

use std::hint::black_box;

use classbench::analysis::{CleanOptions, TextCleaner};
use classbench::ml::{
    ClassifierRegistry, FeatureMatrix, ModelEvaluator, TfIdfVectorizer, Vectorizer,
};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};

/// Generate review-like documents for benchmarking.
fn generate_reviews(count: usize) -> Vec<String> {
    let words = [
        "The", "movie", "was", "AMAZING!!", "acting", "terrible", "plot", "<br />",
        "boring", "wonderful", "scenes", "director's", "cast", "ending", "loved", "hated",
        "2019", "cinematography", "script", "soundtrack",
    ];

    (0..count)
        .map(|i| {
            let length = 40 + (i % 80);
            (0..length)
                .map(|j| words[(i * 7 + j * 13) % words.len()])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Two separable clusters, `n` rows each.
fn generate_blobs(n: usize, dims: usize) -> (FeatureMatrix, Vec<i64>) {
    let mut rows = Vec::with_capacity(2 * n);
    let mut labels = Vec::with_capacity(2 * n);
    for i in 0..2 * n {
        let label = (i % 2) as i64;
        let center = if label == 0 { 1.0 } else { 8.0 };
        let row = (0..dims)
            .map(|j| center + ((i * 31 + j * 17) % 10) as f64 * 0.1)
            .collect();
        rows.push(row);
        labels.push(label);
    }
    (FeatureMatrix::from_rows(rows).unwrap(), labels)
}

fn bench_cleaning(c: &mut Criterion) {
    let mut group = c.benchmark_group("cleaning");

    let cleaner = TextCleaner::new().unwrap();
    let reviews = generate_reviews(1000);
    let options = CleanOptions {
        remove_stopwords: true,
        stem: true,
        ..CleanOptions::default()
    };

    group.bench_function("clean_single_review", |b| {
        b.iter(|| black_box(cleaner.clean(black_box(&reviews[0]), &options)))
    });

    group.throughput(Throughput::Elements(reviews.len() as u64));
    group.bench_function("clean_all_reviews", |b| {
        b.iter(|| black_box(cleaner.clean_all(black_box(&reviews), &options)))
    });

    group.finish();
}

fn bench_vectorize(c: &mut Criterion) {
    let mut group = c.benchmark_group("vectorize");

    let cleaner = TextCleaner::new().unwrap();
    let cleaned: Vec<String> = cleaner
        .clean_all(&generate_reviews(1000), &CleanOptions::default())
        .unwrap()
        .into_iter()
        .map(|c| c.into_text())
        .collect();

    group.throughput(Throughput::Elements(cleaned.len() as u64));
    group.bench_function("tfidf_fit_transform", |b| {
        b.iter(|| {
            let mut vectorizer = TfIdfVectorizer::new();
            black_box(vectorizer.fit_transform(black_box(&cleaned)))
        })
    });

    group.finish();
}

fn bench_classifiers(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifier_fit");
    group.sample_size(10);

    let (x, y) = generate_blobs(100, 8);
    let registry = ClassifierRegistry::default_roster();
    for name in ["DecisionTree", "RandomForest", "LogisticRegression", "XGBoost"] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut clf = registry.create(name).unwrap();
                clf.fit(black_box(&x), black_box(&y)).unwrap();
                black_box(clf)
            })
        });
    }

    group.finish();
}

fn bench_evaluate_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_all");
    group.sample_size(10);

    let (x_train, y_train) = generate_blobs(60, 2);
    let (x_val, y_val) = generate_blobs(20, 2);

    for parallel in [false, true] {
        let evaluator = ModelEvaluator::default().with_parallel(parallel);
        let label = if parallel { "parallel" } else { "sequential" };
        group.bench_function(label, |b| {
            b.iter(|| black_box(evaluator.evaluate_all(&x_train, &y_train, &x_val, &y_val)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cleaning, bench_vectorize, bench_classifiers);
criterion_group!(slow_benches, bench_evaluate_all);

criterion_main!(benches, slow_benches);
