//! Benchmarks for baseline fitting and membership checks
//!
//! Run with: cargo bench --package baseline-model

use baseline_model::{BaselineConfig, BaselineModel};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use feature_engine::{FeatureDataset, FeatureField, FeatureVector};
use std::time::Duration;

/// Baseline sessions with mild deterministic spread around one operating point
fn create_dataset(rows: usize) -> FeatureDataset {
    let vectors: Vec<FeatureVector> = (0..rows)
        .map(|i| {
            let mut vector = FeatureVector::default();
            for (j, field) in FeatureField::ALL.iter().enumerate() {
                vector.set(*field, 1.0 + 0.2 * ((i * 17 + j * 31) as f64 * 0.1).sin());
            }
            vector
        })
        .collect();
    FeatureDataset::from_vectors(&vectors)
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("Baseline Fit");
    group.measurement_time(Duration::from_secs(5));

    for &rows in &[100usize, 500, 1000] {
        let dataset = create_dataset(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("fit", rows), &dataset, |b, data| {
            b.iter(|| {
                let mut model = BaselineModel::new(BaselineConfig::default());
                black_box(model.fit(black_box(data)).ok())
            })
        });
    }

    group.finish();
}

fn bench_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("Membership Check");

    for &rows in &[100usize, 1000, 5000] {
        let mut model = BaselineModel::default();
        if model.fit(&create_dataset(rows)).is_err() {
            continue;
        }

        let mut query = FeatureVector::default();
        for field in FeatureField::ALL {
            query.set(field, 1.1);
        }

        group.bench_with_input(BenchmarkId::new("predict_is_anomalous", rows), &query, |b, p| {
            b.iter(|| black_box(model.predict_is_anomalous(black_box(p)).ok()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fit, bench_predict);
criterion_main!(benches);
