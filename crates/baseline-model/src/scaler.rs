//! Per-Column Standardization

use serde::{Deserialize, Serialize};

/// Z-score scaler fitted on a batch: `(x - mean) / scale`.
///
/// Columns with zero variance get a scale of 1 so they pass through centered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit on `rows`, each holding `num_features` values
    pub fn fit(rows: &[Vec<f64>], num_features: usize) -> Self {
        if rows.is_empty() {
            return Self::identity(num_features);
        }

        let n = rows.len() as f64;
        let mut means = vec![0.0; num_features];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        means.iter_mut().for_each(|m| *m /= n);

        let mut variances = vec![0.0; num_features];
        for row in rows {
            for ((var, mean), value) in variances.iter_mut().zip(&means).zip(row) {
                let d = value - mean;
                *var += d * d;
            }
        }

        let scales = variances
            .into_iter()
            .map(|v| {
                let std_dev = (v / n).sqrt();
                if std_dev > 0.0 && std_dev.is_finite() {
                    std_dev
                } else {
                    1.0
                }
            })
            .collect();

        Self { means, scales }
    }

    /// Scaler that leaves values unchanged
    pub fn identity(num_features: usize) -> Self {
        Self {
            means: vec![0.0; num_features],
            scales: vec![1.0; num_features],
        }
    }

    /// Standardize one row
    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(value, (mean, scale))| (value - mean) / scale)
            .collect()
    }

    /// Standardize every row
    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    pub fn num_features(&self) -> usize {
        self.means.len()
    }
}
