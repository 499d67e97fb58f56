//! End-to-end baseline scenarios: fitting, membership, persistence

use baseline_model::{BaselineConfig, BaselineModel, ModelError, Verdict};
use feature_engine::{ExtractorConfig, FeatureDataset, FeatureField, FeatureVector, SessionProcessor};
use proptest::prelude::*;
use signal_window::{RawSignal, WindowConfig};
use std::f64::consts::PI;

/// Deterministic jitter in [-1, 1]
fn jitter(i: usize, j: usize) -> f64 {
    ((i as f64) * 12.9898 + (j as f64) * 78.233).sin()
}

fn vector_from(values: [f64; 7]) -> FeatureVector {
    let mut vector = FeatureVector::default();
    for (field, value) in FeatureField::ALL.iter().zip(values) {
        vector.set(*field, value);
    }
    vector
}

/// 100 points tightly around the origin plus 5 far away
fn clustered_with_outliers() -> FeatureDataset {
    let mut vectors: Vec<FeatureVector> = (0..100)
        .map(|i| vector_from(std::array::from_fn(|j| 0.01 * jitter(i, j))))
        .collect();
    vectors.extend((0..5).map(|i| vector_from(std::array::from_fn(|j| 50.0 + 0.01 * jitter(i + 500, j)))));
    FeatureDataset::from_vectors(&vectors)
}

#[test]
fn test_outliers_excluded_from_normal_region() {
    let mut model = BaselineModel::new(BaselineConfig {
        eps: 1.5,
        ..Default::default()
    });
    let summary = model.fit(&clustered_with_outliers()).unwrap();

    assert_eq!(summary.min_samples, 14);
    assert_eq!(summary.n_clusters, 1);
    assert_eq!(summary.n_noise, 5);
    assert_eq!(summary.normal_region_size, 100);

    assert!(!model.predict_is_anomalous(&vector_from([0.0; 7])).unwrap());
    assert!(model.predict_is_anomalous(&vector_from([50.0; 7])).unwrap());
}

#[test]
fn test_batch_labels() {
    let mut model = BaselineModel::default();
    model.fit(&clustered_with_outliers()).unwrap();

    let queries = FeatureDataset::from_vectors(&[vector_from([0.0; 7]), vector_from([50.0; 7])]);
    assert_eq!(
        model.predict_batch(&queries).unwrap(),
        vec![Verdict::Normal, Verdict::Anomaly]
    );
}

#[test]
fn test_save_load_round_trip() {
    let mut model = BaselineModel::default();
    model.fit(&clustered_with_outliers()).unwrap();

    let path = std::env::temp_dir().join(format!("baseline-roundtrip-{}.bin", std::process::id()));
    model.save(&path).unwrap();
    let loaded = BaselineModel::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded, model);
    for i in 0..20 {
        let query = vector_from(std::array::from_fn(|j| 2.0 * jitter(i + 1000, j) + (i as f64)));
        let row = query.values();
        assert_eq!(
            loaded.nearest_distance(&row).unwrap().map(f64::to_bits),
            model.nearest_distance(&row).unwrap().map(f64::to_bits)
        );
        assert_eq!(
            loaded.predict_is_anomalous(&query).unwrap(),
            model.predict_is_anomalous(&query).unwrap()
        );
    }
}

#[test]
fn test_load_missing_file() {
    let path = std::env::temp_dir().join("baseline-does-not-exist.bin");
    assert!(matches!(BaselineModel::load(&path), Err(ModelError::Io(_))));
}

/// Steady 2 Hz motion with slowly varying amplitude and a faint 5 Hz component
fn baseline_signal(seconds: usize) -> Vec<f64> {
    (0..seconds * 100)
        .map(|i| {
            let t = i as f64 / 100.0;
            let amplitude = 0.4 * (1.0 + 0.3 * (2.0 * PI * t / 20.0).sin());
            amplitude * (2.0 * PI * 2.0 * t).sin() + 0.05 * (2.0 * PI * 5.0 * t).sin()
        })
        .collect()
}

#[test]
fn test_pipeline_flags_tremor_window() {
    let mut processor = SessionProcessor::new(WindowConfig::default(), ExtractorConfig::default()).unwrap();
    let signal = RawSignal::new(baseline_signal(20), 100.0).unwrap();
    let baseline = processor.process_signal(&signal);
    assert_eq!(baseline.len(), 39);

    let mut model = BaselineModel::new(BaselineConfig {
        eps: 3.0,
        min_samples: Some(4),
        ..Default::default()
    });
    let summary = model.fit(&baseline).unwrap();
    assert_eq!(summary.n_noise, 0);

    let member = baseline.row(10).unwrap().to_vec();
    assert!(!model.predict_row(&member).unwrap());

    let tremor: Vec<f64> = baseline_signal(1)
        .iter()
        .enumerate()
        .map(|(i, v)| v + 0.3 * (2.0 * PI * 6.0 * i as f64 / 100.0).sin())
        .collect();
    let tremor_signal = RawSignal::new(tremor, 100.0).unwrap();
    let tremor_features = processor.process_signal(&tremor_signal);
    assert_eq!(tremor_features.len(), 1);
    assert_eq!(model.predict_batch(&tremor_features).unwrap(), vec![Verdict::Anomaly]);
}

proptest! {
    #[test]
    fn prop_prediction_is_idempotent(values in proptest::array::uniform7(-100.0f64..100.0)) {
        let mut model = BaselineModel::default();
        model.fit(&clustered_with_outliers()).unwrap();

        let query = vector_from(values);
        let first = model.predict_is_anomalous(&query).unwrap();
        let second = model.predict_is_anomalous(&query).unwrap();
        prop_assert_eq!(first, second);
    }
}
