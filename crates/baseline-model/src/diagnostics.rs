//! Offline Diagnostics: eps selection and 2-D inspection
//!
//! Everything here standardizes the given dataset with its own scaler; none
//! of it touches a fitted model.

use crate::dbscan::{count_clusters, euclidean, ClusterLabel, Dbscan};
use crate::scaler::StandardScaler;
use feature_engine::FeatureDataset;
use nalgebra::{DMatrix, SymmetricEigen};
use serde::{Deserialize, Serialize};
use tracing::debug;

fn standardized(dataset: &FeatureDataset) -> Vec<Vec<f64>> {
    StandardScaler::fit(dataset.rows(), dataset.num_features()).transform(dataset.rows())
}

/// Sorted distances from every point to its k-th nearest neighbour.
///
/// The point itself is not its own neighbour; `k` is capped at the number of
/// other points. Fewer than two points, or `k == 0`, give an empty curve.
pub fn k_distance(dataset: &FeatureDataset, k: usize) -> Vec<f64> {
    let n = dataset.len();
    if n < 2 || k == 0 {
        return Vec::new();
    }
    let k = k.min(n - 1);
    let points = standardized(dataset);

    let mut curve: Vec<f64> = (0..n)
        .map(|i| {
            let mut distances: Vec<f64> = (0..n)
                .filter(|&j| j != i)
                .map(|j| euclidean(&points[i], &points[j]))
                .collect();
            let (_, kth, _) = distances.select_nth_unstable_by(k - 1, f64::total_cmp);
            *kth
        })
        .collect();
    curve.sort_by(f64::total_cmp);

    debug!("k-distance curve over {} points (k={})", n, k);
    curve
}

/// Project a dataset onto its two leading principal axes.
///
/// Returns `None` when the dataset has fewer than two feature columns.
/// Axis signs are fixed so the largest loading of each axis is positive.
pub fn project_2d(dataset: &FeatureDataset) -> Option<Vec<(f64, f64)>> {
    let d = dataset.num_features();
    if d < 2 {
        return None;
    }
    let n = dataset.len();
    if n == 0 {
        return Some(Vec::new());
    }

    let x = DMatrix::from_row_iterator(n, d, standardized(dataset).into_iter().flatten());
    let means = x.row_mean();
    let centered = DMatrix::from_fn(n, d, |i, j| x[(i, j)] - means[j]);
    let covariance = centered.transpose() * &centered / (n.max(2) - 1) as f64;

    let eigen = SymmetricEigen::new(covariance);
    let mut order: Vec<usize> = (0..d).collect();
    order.sort_by(|&i, &j| eigen.eigenvalues[j].total_cmp(&eigen.eigenvalues[i]));

    let mut axes = DMatrix::<f64>::zeros(d, 2);
    for (out, &idx) in order.iter().take(2).enumerate() {
        let mut axis = eigen.eigenvectors.column(idx).into_owned();
        let dominant = axis
            .iter()
            .copied()
            .max_by(|a, b| a.abs().total_cmp(&b.abs()))
            .unwrap_or(0.0);
        if dominant < 0.0 {
            axis.neg_mut();
        }
        axes.set_column(out, &axis);
    }

    let projected = centered * axes;
    Some((0..n).map(|i| (projected[(i, 0)], projected[(i, 1)])).collect())
}

/// Standalone clustering of a dataset for inspection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport {
    pub labels: Vec<ClusterLabel>,
    pub n_clusters: usize,
    pub n_noise: usize,
    /// 2-D projection, absent for single-column datasets
    pub projection: Option<Vec<(f64, f64)>>,
}

/// Cluster a dataset under its own standardization and project it to 2-D
pub fn cluster_report(dataset: &FeatureDataset, eps: f64, min_samples: usize) -> ClusterReport {
    if dataset.is_empty() {
        return ClusterReport::default();
    }

    let labels = Dbscan::new(eps, min_samples).fit_predict(&standardized(dataset));
    let (n_clusters, n_noise) = count_clusters(&labels);

    ClusterReport {
        labels,
        n_clusters,
        n_noise,
        projection: project_2d(dataset),
    }
}
