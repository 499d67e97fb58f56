//! FFT-based Tremor Spectrum Analysis

use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Frequency interval associated with resting tremor (Hz, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TremorBand {
    /// Lower edge (default: 4 Hz)
    pub min_hz: f64,
    /// Upper edge (default: 8 Hz)
    pub max_hz: f64,
}

impl Default for TremorBand {
    fn default() -> Self {
        Self {
            min_hz: 4.0,
            max_hz: 8.0,
        }
    }
}

impl TremorBand {
    /// Create a band from its edges (Hz)
    pub fn new(min_hz: f64, max_hz: f64) -> Self {
        Self { min_hz, max_hz }
    }

    /// Whether a frequency lies inside the band, edges included
    pub fn contains(&self, frequency: f64) -> bool {
        frequency >= self.min_hz && frequency <= self.max_hz
    }

    pub fn is_valid(&self) -> bool {
        self.min_hz.is_finite() && self.max_hz.is_finite() && self.min_hz >= 0.0 && self.min_hz < self.max_hz
    }
}

/// One positive-frequency bin of a one-sided spectrum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumBin {
    /// Bin centre frequency (Hz)
    pub frequency: f64,
    /// Amplitude scaled by 2/N
    pub magnitude: f64,
}

/// Strongest bin inside the tremor band
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DominantPeak {
    /// Peak frequency (Hz)
    pub frequency: f64,
    /// Peak amplitude, same scale as `SpectrumBin::magnitude`
    pub amplitude: f64,
}

/// One-sided magnitude spectrum plus the in-band peak
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectrumResult {
    /// Bins with strictly positive frequency, ascending
    pub bins: Vec<SpectrumBin>,
    /// `(0, 0)` when no bin falls inside the band
    pub dominant: DominantPeak,
}

impl SpectrumResult {
    /// True for degenerate input (no samples or no sample rate)
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Sum of magnitudes whose frequency lies in `band`
    pub fn band_magnitude(&self, band: &TremorBand) -> f64 {
        self.bins
            .iter()
            .filter(|b| band.contains(b.frequency))
            .map(|b| b.magnitude)
            .sum()
    }

    /// Sum of all retained magnitudes
    pub fn total_magnitude(&self) -> f64 {
        self.bins.iter().map(|b| b.magnitude).sum()
    }
}

/// Computes one-sided amplitude spectra of fixed-length sample windows
pub struct SpectralAnalyzer {
    /// FFT planner; caches plans across equal-length windows
    planner: FftPlanner<f64>,
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectralAnalyzer {
    /// Create a new analyzer with an empty plan cache
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Spectrum of `samples` taken at `sample_rate` Hz, with the peak searched
    /// inside `band`.
    ///
    /// The mean is removed before the transform and magnitudes are scaled by
    /// `2/N`, so a sinusoid of amplitude `A` on an exact bin reports `A`.
    /// Empty input or a non-positive rate gives an empty result.
    pub fn analyze(&mut self, samples: &[f64], sample_rate: f64, band: TremorBand) -> SpectrumResult {
        let n = samples.len();
        if n == 0 || !(sample_rate > 0.0) {
            return SpectrumResult::default();
        }

        let mean = samples.iter().sum::<f64>() / n as f64;
        let mut buffer: Vec<Complex<f64>> = samples
            .iter()
            .map(|&v| Complex::new(v - mean, 0.0))
            .collect();

        let fft = self.planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        // k / (N * dt); bins 1..=(N-1)/2 are the strictly positive frequencies
        let resolution = sample_rate / n as f64;
        let scale = 2.0 / n as f64;
        let bins: Vec<SpectrumBin> = buffer
            .iter()
            .enumerate()
            .take((n + 1) / 2)
            .skip(1)
            .map(|(k, c)| SpectrumBin {
                frequency: k as f64 * resolution,
                magnitude: c.norm() * scale,
            })
            .collect();

        let mut dominant: Option<SpectrumBin> = None;
        for bin in bins.iter().filter(|b| band.contains(b.frequency)) {
            match dominant {
                Some(best) if bin.magnitude <= best.magnitude => {}
                _ => dominant = Some(*bin),
            }
        }
        let dominant = dominant
            .map(|b| DominantPeak {
                frequency: b.frequency,
                amplitude: b.magnitude,
            })
            .unwrap_or_default();

        trace!(
            "Spectrum: {} bins at {:.3} Hz resolution, peak {:.2} Hz ({:.4})",
            bins.len(),
            resolution,
            dominant.frequency,
            dominant.amplitude
        );

        SpectrumResult { bins, dominant }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, amplitude: f64, offset: f64, n: usize, rate: f64) -> Vec<f64> {
        (0..n)
            .map(|i| offset + amplitude * (2.0 * PI * freq * i as f64 / rate).sin())
            .collect()
    }

    #[test]
    fn test_sine_peak_in_band() {
        let mut analyzer = SpectralAnalyzer::new();
        let rate = 100.0;
        let n = 200;
        let signal = sine(6.0, 1.0, 0.0, n, rate);

        let result = analyzer.analyze(&signal, rate, TremorBand::default());

        assert!((result.dominant.frequency - 6.0).abs() <= rate / n as f64);
        assert!((result.dominant.amplitude - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_off_bin_sine_within_one_bin() {
        let mut analyzer = SpectralAnalyzer::new();
        let rate = 100.0;
        let n = 128;
        let signal = sine(5.3, 0.4, 0.0, n, rate);

        let result = analyzer.analyze(&signal, rate, TremorBand::default());
        assert!((result.dominant.frequency - 5.3).abs() <= rate / n as f64);
    }

    #[test]
    fn test_dc_removed() {
        let mut analyzer = SpectralAnalyzer::new();
        let signal = sine(5.0, 0.5, 9.81, 100, 100.0);
        let result = analyzer.analyze(&signal, 100.0, TremorBand::default());

        assert!(result.bins.iter().all(|b| b.frequency > 0.0));
        assert!((result.dominant.frequency - 5.0).abs() < 1e-9);
        assert!((result.dominant.amplitude - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_positive_bins_only() {
        let mut analyzer = SpectralAnalyzer::new();
        let even = analyzer.analyze(&[1.0, 2.0, 3.0, 4.0], 4.0, TremorBand::default());
        assert_eq!(even.bins.len(), 1);
        assert_eq!(even.bins[0].frequency, 1.0);

        let odd = analyzer.analyze(&[1.0, 2.0, 3.0, 4.0, 5.0], 5.0, TremorBand::default());
        assert_eq!(odd.bins.len(), 2);
        assert_eq!(odd.bins[1].frequency, 2.0);
    }

    #[test]
    fn test_peak_outside_band_ignored() {
        let mut analyzer = SpectralAnalyzer::new();
        // Strong 2 Hz motion plus a weak 6 Hz tremor
        let slow = sine(2.0, 3.0, 0.0, 200, 100.0);
        let tremor = sine(6.0, 0.2, 0.0, 200, 100.0);
        let signal: Vec<f64> = slow.iter().zip(&tremor).map(|(a, b)| a + b).collect();

        let result = analyzer.analyze(&signal, 100.0, TremorBand::default());
        assert!((result.dominant.frequency - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_bin_in_band() {
        let mut analyzer = SpectralAnalyzer::new();
        // 4 samples at 4 Hz: only a 1 Hz bin exists
        let result = analyzer.analyze(&[0.0, 1.0, 0.0, -1.0], 4.0, TremorBand::default());
        assert_eq!(result.dominant, DominantPeak::default());
        assert!(!result.is_empty());
    }

    #[test]
    fn test_degenerate_inputs() {
        let mut analyzer = SpectralAnalyzer::new();
        let empty = analyzer.analyze(&[], 100.0, TremorBand::default());
        assert!(empty.is_empty());
        assert_eq!(empty.dominant, DominantPeak::default());

        let bad_rate = analyzer.analyze(&[1.0, 2.0, 3.0], 0.0, TremorBand::default());
        assert!(bad_rate.is_empty());
        let negative_rate = analyzer.analyze(&[1.0, 2.0, 3.0], -5.0, TremorBand::default());
        assert_eq!(negative_rate.dominant, DominantPeak::default());
    }

    #[test]
    fn test_band_and_total_magnitude() {
        let mut analyzer = SpectralAnalyzer::new();
        let signal = sine(6.0, 1.0, 0.0, 200, 100.0);
        let result = analyzer.analyze(&signal, 100.0, TremorBand::default());

        let band = result.band_magnitude(&TremorBand::default());
        let total = result.total_magnitude();
        assert!(band > 0.0);
        assert!(band <= total + 1e-12);
        assert!(band / total > 0.9);
    }
}
