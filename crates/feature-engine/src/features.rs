//! Feature Vector Assembly

use crate::spectral::{SpectralAnalyzer, TremorBand};
use crate::statistics::{differences, SignalStatistics};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Feature columns in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureField {
    /// Dominant frequency inside the tremor band (Hz)
    PeakFreq,
    /// Summed magnitude inside the tremor band
    TremorPower,
    /// Summed magnitude over all positive frequencies
    TotalPower,
    /// `tremor_power / total_power`, or 0
    TremorIndex,
    /// Number of tap events
    TapCount,
    /// Taps per second
    TapFreq,
    /// Standard deviation of inter-tap intervals (s)
    TapIntervalStd,
}

impl FeatureField {
    /// Every field, in column order
    pub const ALL: [FeatureField; 7] = [
        FeatureField::PeakFreq,
        FeatureField::TremorPower,
        FeatureField::TotalPower,
        FeatureField::TremorIndex,
        FeatureField::TapCount,
        FeatureField::TapFreq,
        FeatureField::TapIntervalStd,
    ];

    /// Rest/tremor schema
    pub const REST: [FeatureField; 4] = [
        FeatureField::PeakFreq,
        FeatureField::TremorPower,
        FeatureField::TotalPower,
        FeatureField::TremorIndex,
    ];

    /// Tapping schema
    pub const TAPPING: [FeatureField; 3] = [
        FeatureField::TapCount,
        FeatureField::TapFreq,
        FeatureField::TapIntervalStd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FeatureField::PeakFreq => "peak_freq",
            FeatureField::TremorPower => "tremor_power",
            FeatureField::TotalPower => "total_power",
            FeatureField::TremorIndex => "tremor_index",
            FeatureField::TapCount => "tap_count",
            FeatureField::TapFreq => "tap_freq",
            FeatureField::TapIntervalStd => "tap_interval_std",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// Fixed-schema feature vector. Always carries every field; fields that do
/// not apply to the recording kind stay at zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Dominant in-band frequency (Hz)
    pub peak_freq: f64,
    /// Sum of in-band magnitudes
    pub tremor_power: f64,
    /// Sum of all positive-frequency magnitudes
    pub total_power: f64,
    /// `tremor_power / total_power`, 0 when there is no power
    pub tremor_index: f64,
    /// Number of tap events
    pub tap_count: f64,
    /// Taps per second of the recording
    pub tap_freq: f64,
    /// Standard deviation of inter-tap intervals (s)
    pub tap_interval_std: f64,
    /// Optional category (e.g. the test or session name)
    pub label: Option<String>,
}

impl FeatureVector {
    /// All-zero vector carrying only a label
    pub fn neutral(label: Option<String>) -> Self {
        Self {
            label,
            ..Default::default()
        }
    }

    /// Value of one field
    pub fn get(&self, field: FeatureField) -> f64 {
        match field {
            FeatureField::PeakFreq => self.peak_freq,
            FeatureField::TremorPower => self.tremor_power,
            FeatureField::TotalPower => self.total_power,
            FeatureField::TremorIndex => self.tremor_index,
            FeatureField::TapCount => self.tap_count,
            FeatureField::TapFreq => self.tap_freq,
            FeatureField::TapIntervalStd => self.tap_interval_std,
        }
    }

    pub fn set(&mut self, field: FeatureField, value: f64) {
        match field {
            FeatureField::PeakFreq => self.peak_freq = value,
            FeatureField::TremorPower => self.tremor_power = value,
            FeatureField::TotalPower => self.total_power = value,
            FeatureField::TremorIndex => self.tremor_index = value,
            FeatureField::TapCount => self.tap_count = value,
            FeatureField::TapFreq => self.tap_freq = value,
            FeatureField::TapIntervalStd => self.tap_interval_std = value,
        }
    }

    /// Look up a field by its column name
    pub fn value_of(&self, name: &str) -> Option<f64> {
        FeatureField::from_name(name).map(|f| self.get(f))
    }

    /// Values in `FeatureField::ALL` order
    pub fn values(&self) -> [f64; 7] {
        FeatureField::ALL.map(|f| self.get(f))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// True when every numeric field is zero
    pub fn is_neutral(&self) -> bool {
        self.values().iter().all(|v| *v == 0.0)
    }
}

/// Closed set of recording kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordingKind {
    Rest,
    Tapping,
    Unknown,
}

impl RecordingKind {
    /// Map a free-form test name onto a kind (case-insensitive)
    pub fn from_test_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("rest") || name.contains("repouso") {
            RecordingKind::Rest
        } else if name.contains("tapping") {
            RecordingKind::Tapping
        } else {
            RecordingKind::Unknown
        }
    }
}

/// Measurement payload, one variant per recording kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Measurement {
    /// Continuous acceleration samples
    Rest { samples: Vec<f64>, sample_rate: f64 },
    /// Ordered tap timestamps (s) over a nominal duration (s)
    Tapping { timestamps: Vec<f64>, duration: f64 },
    /// A test kind this extractor has no features for
    Unknown { name: String },
}

impl Measurement {
    pub fn kind(&self) -> RecordingKind {
        match self {
            Measurement::Rest { .. } => RecordingKind::Rest,
            Measurement::Tapping { .. } => RecordingKind::Tapping,
            Measurement::Unknown { .. } => RecordingKind::Unknown,
        }
    }
}

/// One discrete test recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub label: Option<String>,
    pub measurement: Measurement,
}

impl Recording {
    /// Create a rest/tremor recording
    pub fn rest(samples: Vec<f64>, sample_rate: f64) -> Self {
        Self {
            label: None,
            measurement: Measurement::Rest { samples, sample_rate },
        }
    }

    /// Create a tapping recording
    pub fn tapping(timestamps: Vec<f64>, duration: f64) -> Self {
        Self {
            label: None,
            measurement: Measurement::Tapping { timestamps, duration },
        }
    }

    /// Build a recording from a named test, interpreting `readings` as
    /// samples or tap timestamps depending on the name
    pub fn from_named_test(name: &str, readings: Vec<f64>, sample_rate: f64, duration: f64) -> Self {
        let measurement = match RecordingKind::from_test_name(name) {
            RecordingKind::Rest => Measurement::Rest {
                samples: readings,
                sample_rate,
            },
            RecordingKind::Tapping => Measurement::Tapping {
                timestamps: readings,
                duration,
            },
            RecordingKind::Unknown => Measurement::Unknown {
                name: name.to_string(),
            },
        };
        Self {
            label: None,
            measurement,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn kind(&self) -> RecordingKind {
        self.measurement.kind()
    }
}

/// Feature extraction settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Tremor frequency band
    pub band: TremorBand,
    /// Windows whose sample standard deviation falls below this are treated
    /// as a flat / disconnected sensor (default: 0.1)
    pub flatness_threshold: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            band: TremorBand::default(),
            flatness_threshold: 0.1,
        }
    }
}

/// Maps recordings and windows to feature vectors
pub struct FeatureExtractor {
    analyzer: SpectralAnalyzer,
    config: ExtractorConfig,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

impl FeatureExtractor {
    /// Create a new extractor with its own FFT planner
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            analyzer: SpectralAnalyzer::new(),
            config,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract features from a recording; never fails
    pub fn extract(&mut self, recording: &Recording) -> FeatureVector {
        let mut features = match &recording.measurement {
            Measurement::Rest { samples, sample_rate } => self.extract_rest(samples, *sample_rate),
            Measurement::Tapping { timestamps, duration } => Self::extract_tapping(timestamps, *duration),
            Measurement::Unknown { name } => {
                debug!("No features for test kind {:?}", name);
                FeatureVector::default()
            }
        };
        features.label = recording.label.clone();
        features
    }

    /// Rest/tremor features of one window of samples
    pub fn extract_rest(&mut self, samples: &[f64], sample_rate: f64) -> FeatureVector {
        if samples.is_empty() || !(sample_rate > 0.0) {
            return FeatureVector::default();
        }

        let stats = SignalStatistics::compute(samples);
        if !(stats.std_dev >= self.config.flatness_threshold) {
            warn!(
                "Flat signal (std={:.4} < {}), sensor may be disconnected",
                stats.std_dev, self.config.flatness_threshold
            );
            return FeatureVector::default();
        }

        let band = self.config.band;
        let spectrum = self.analyzer.analyze(samples, sample_rate, band);

        let mut tremor_power = 0.0;
        let mut total_power = 0.0;
        for bin in &spectrum.bins {
            total_power += bin.magnitude;
            if band.contains(bin.frequency) {
                tremor_power += bin.magnitude;
            }
        }
        let tremor_index = if total_power > 0.0 {
            (tremor_power / total_power).min(1.0)
        } else {
            0.0
        };

        FeatureVector {
            peak_freq: spectrum.dominant.frequency,
            tremor_power,
            total_power,
            tremor_index,
            ..Default::default()
        }
    }

    /// Tapping features from event timestamps over `duration` seconds
    pub fn extract_tapping(timestamps: &[f64], duration: f64) -> FeatureVector {
        if timestamps.len() < 2 || !(duration > 0.0) {
            return FeatureVector::default();
        }

        let intervals = differences(timestamps);
        let tap_count = timestamps.len() as f64;

        FeatureVector {
            tap_count,
            tap_freq: tap_count / duration,
            tap_interval_std: SignalStatistics::compute(&intervals).std_dev,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::PI;

    fn tremor_window(freq: f64, amplitude: f64, n: usize, rate: f64) -> Vec<f64> {
        (0..n)
            .map(|i| 0.98 + amplitude * (2.0 * PI * freq * i as f64 / rate).sin())
            .collect()
    }

    #[test]
    fn test_rest_features() {
        let mut extractor = FeatureExtractor::default();
        let recording = Recording::rest(tremor_window(5.0, 1.0, 200, 100.0), 100.0).with_label("rest");

        let features = extractor.extract(&recording);

        assert!((features.peak_freq - 5.0).abs() < 1e-9);
        assert!(features.tremor_power > 0.0);
        assert!(features.tremor_power <= features.total_power);
        assert!((features.tremor_index - features.tremor_power / features.total_power).abs() < 1e-12);
        assert_eq!(features.tap_count, 0.0);
        assert_eq!(features.label.as_deref(), Some("rest"));
    }

    #[test]
    fn test_flat_signal_is_neutral() {
        let mut extractor = FeatureExtractor::default();
        for mean in [0.0, 1.0, -9.81, 1e6] {
            let samples: Vec<f64> = (0..200).map(|i| mean + 0.001 * (i as f64).sin()).collect();
            let features = extractor.extract_rest(&samples, 100.0);
            assert!(features.is_neutral(), "mean {} should give neutral features", mean);
        }
    }

    #[test]
    fn test_rest_degenerate_inputs() {
        let mut extractor = FeatureExtractor::default();
        assert!(extractor.extract_rest(&[], 100.0).is_neutral());
        assert!(extractor.extract_rest(&[0.0, 1.0, 0.0, -1.0], 0.0).is_neutral());
    }

    #[test]
    fn test_tapping_scenario() {
        let recording = Recording::tapping(vec![0.0, 0.2, 0.41, 0.59], 1.0);
        let features = FeatureExtractor::default().extract(&recording);

        let intervals = [0.2, 0.41 - 0.2, 0.59 - 0.41];
        let mean = intervals.iter().sum::<f64>() / 3.0;
        let expected_std = (intervals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 3.0).sqrt();

        assert_eq!(features.tap_count, 4.0);
        assert_eq!(features.tap_freq, 4.0);
        assert!((features.tap_interval_std - expected_std).abs() < 1e-12);
        assert!((features.tap_interval_std - 0.012472191).abs() < 1e-6);
        assert_eq!(features.peak_freq, 0.0);
    }

    #[test]
    fn test_tapping_needs_two_events_and_duration() {
        assert!(FeatureExtractor::extract_tapping(&[0.3], 1.0).is_neutral());
        assert!(FeatureExtractor::extract_tapping(&[0.1, 0.2], 0.0).is_neutral());
    }

    #[test]
    fn test_unknown_kind_keeps_label_only() {
        let recording = Recording::from_named_test("Pronation-Supination", vec![1.0, 2.0], 100.0, 10.0)
            .with_label("session-3");
        let features = FeatureExtractor::default().extract(&recording);
        assert!(features.is_neutral());
        assert_eq!(features.label.as_deref(), Some("session-3"));
    }

    #[test]
    fn test_kind_from_test_name() {
        assert_eq!(RecordingKind::from_test_name("Tremor de Repouso"), RecordingKind::Rest);
        assert_eq!(RecordingKind::from_test_name("Rest tremor"), RecordingKind::Rest);
        assert_eq!(RecordingKind::from_test_name("Finger Tapping"), RecordingKind::Tapping);
        assert_eq!(RecordingKind::from_test_name("Walking"), RecordingKind::Unknown);

        let tapping = Recording::from_named_test("Finger Tapping", vec![0.0, 0.5], 0.0, 1.0);
        assert_eq!(tapping.kind(), RecordingKind::Tapping);
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in FeatureField::ALL {
            assert_eq!(FeatureField::from_name(field.name()), Some(field));
        }
        let mut vector = FeatureVector::default();
        vector.set(FeatureField::TapFreq, 2.5);
        assert_eq!(vector.value_of("tap_freq"), Some(2.5));
        assert_eq!(vector.value_of("nope"), None);
    }

    proptest! {
        #[test]
        fn prop_tremor_index_bounded(
            samples in proptest::collection::vec(-5.0f64..5.0, 0..256),
            rate in 10.0f64..500.0,
        ) {
            let mut extractor = FeatureExtractor::default();
            let features = extractor.extract_rest(&samples, rate);
            if features.total_power > 0.0 {
                prop_assert!(features.tremor_index >= 0.0 && features.tremor_index <= 1.0);
            } else {
                prop_assert_eq!(features.tremor_index, 0.0);
            }
        }
    }
}
