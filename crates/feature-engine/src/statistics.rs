//! Summary Statistics over Sample Sequences

/// Population statistics of a sequence (divisor N, not N-1)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SignalStatistics {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SignalStatistics {
    /// Compute statistics; an empty slice gives all zeros
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

        Self {
            mean,
            std_dev: variance.sqrt(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    /// Peak-to-peak range
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Consecutive differences `v[i+1] - v[i]`
pub fn differences(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}
