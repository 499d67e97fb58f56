//! Session Processing: raw samples to per-window features

use crate::dataset::FeatureDataset;
use crate::features::{ExtractorConfig, FeatureExtractor};
use crate::FeatureError;
use signal_window::{RawSignal, SampleTable, WindowConfig, Windower};
use tracing::{info, warn};

/// Segments a recorded session and extracts rest/tremor features per window
pub struct SessionProcessor {
    windower: Windower,
    extractor: FeatureExtractor,
    sample_rate_hz: f64,
}

impl SessionProcessor {
    /// Create a new processor, validating the window configuration
    pub fn new(window: WindowConfig, extractor: ExtractorConfig) -> Result<Self, FeatureError> {
        Ok(Self {
            windower: Windower::new(&window)?,
            extractor: FeatureExtractor::new(extractor),
            sample_rate_hz: window.sample_rate_hz,
        })
    }

    pub fn windower(&self) -> &Windower {
        &self.windower
    }

    /// One feature row per full window. A signal shorter than one window
    /// gives an empty dataset.
    pub fn process_signal(&mut self, signal: &RawSignal) -> FeatureDataset {
        let mut dataset = FeatureDataset::empty();
        let segments = self.windower.segment(signal);
        if segments.is_too_short() {
            return dataset;
        }

        for window in &segments {
            let features = self.extractor.extract_rest(window.samples(), window.sample_rate_hz());
            // Full-schema dataset: every column is a feature field
            if let Err(e) = dataset.push(&features) {
                warn!("Skipping window at {}: {}", window.start(), e);
            }
        }

        info!(
            "Extracted features from {} windows ({} samples, window {}, step {})",
            dataset.len(),
            signal.len(),
            self.windower.window_samples(),
            self.windower.step()
        );
        dataset
    }

    /// Locate the acceleration axis in `table` and process it
    pub fn process_table(&mut self, table: &SampleTable) -> Result<FeatureDataset, FeatureError> {
        if let Some(inferred) = table.inferred_sample_rate() {
            if (inferred - self.sample_rate_hz).abs() > 0.1 * self.sample_rate_hz {
                warn!(
                    "Timestamps suggest {:.1} Hz but the pipeline is configured for {:.1} Hz",
                    inferred, self.sample_rate_hz
                );
            }
        }

        let signal = table.accel_signal(self.sample_rate_hz)?;
        Ok(self.process_signal(&signal))
    }
}
