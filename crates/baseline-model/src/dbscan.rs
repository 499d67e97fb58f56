//! Density-Reachability Clustering (DBSCAN)

use serde::{Deserialize, Serialize};

/// Cluster assignment of one point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterLabel {
    /// Not density-reachable from any core point
    Noise,
    /// Member of the cluster with this id (ids start at 0)
    Cluster(usize),
}

impl ClusterLabel {
    pub fn is_noise(&self) -> bool {
        matches!(self, ClusterLabel::Noise)
    }

    /// Conventional integer form: -1 for noise
    pub fn as_i64(&self) -> i64 {
        match self {
            ClusterLabel::Noise => -1,
            ClusterLabel::Cluster(id) => *id as i64,
        }
    }
}

/// Euclidean distance between two equal-length points
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// DBSCAN over points in Euclidean space.
///
/// A point is a core point when at least `min_samples` points, itself
/// included, lie within distance `eps` (inclusive). Border points join the
/// first cluster that reaches them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dbscan {
    eps: f64,
    min_samples: usize,
}

impl Dbscan {
    /// Create a new clusterer; `min_samples` below 1 is raised to 1
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self {
            eps,
            min_samples: min_samples.max(1),
        }
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    fn within_eps(&self, center: &[f64], point: &[f64]) -> bool {
        euclidean(center, point) <= self.eps
    }

    /// Indices of all points within `eps` of point `idx`, itself included
    fn region_query(&self, points: &[Vec<f64>], idx: usize) -> Vec<usize> {
        let center = &points[idx];
        points
            .iter()
            .enumerate()
            .filter(|(_, p)| self.within_eps(center, p))
            .map(|(j, _)| j)
            .collect()
    }

    fn is_core(&self, points: &[Vec<f64>], idx: usize) -> bool {
        let center = &points[idx];
        points.iter().filter(|p| self.within_eps(center, p)).count() >= self.min_samples
    }

    /// Label every point.
    ///
    /// Neighbourhoods are queried on demand, so memory stays O(n) while time
    /// is O(n²) distance evaluations.
    pub fn fit_predict(&self, points: &[Vec<f64>]) -> Vec<ClusterLabel> {
        let mut labels: Vec<Option<ClusterLabel>> = vec![None; points.len()];
        let mut next_cluster = 0;

        for seed in 0..points.len() {
            if labels[seed].is_some() || !self.is_core(points, seed) {
                continue;
            }

            let cluster = ClusterLabel::Cluster(next_cluster);
            next_cluster += 1;
            labels[seed] = Some(cluster);

            // Only core points enter the frontier
            let mut frontier = vec![seed];
            while let Some(current) = frontier.pop() {
                for neighbor in self.region_query(points, current) {
                    if labels[neighbor].is_some() {
                        continue;
                    }
                    labels[neighbor] = Some(cluster);
                    if self.is_core(points, neighbor) {
                        frontier.push(neighbor);
                    }
                }
            }
        }

        labels
            .into_iter()
            .map(|l| l.unwrap_or(ClusterLabel::Noise))
            .collect()
    }
}

/// Number of distinct clusters and noise points in a labelling
pub fn count_clusters(labels: &[ClusterLabel]) -> (usize, usize) {
    let n_clusters = labels
        .iter()
        .filter_map(|l| match l {
            ClusterLabel::Cluster(id) => Some(id + 1),
            ClusterLabel::Noise => None,
        })
        .max()
        .unwrap_or(0);
    let n_noise = labels.iter().filter(|l| l.is_noise()).count();
    (n_clusters, n_noise)
}
