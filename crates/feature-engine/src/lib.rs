//! Feature Engineering Engine
//!
//! Turns windows of raw motion samples and discrete test recordings into
//! fixed-schema feature vectors for the baseline model.

mod dataset;
mod features;
mod session;
mod spectral;
mod statistics;

pub use dataset::FeatureDataset;
pub use features::{
    ExtractorConfig, FeatureExtractor, FeatureField, FeatureVector, Measurement, Recording, RecordingKind,
};
pub use session::SessionProcessor;
pub use spectral::{DominantPeak, SpectralAnalyzer, SpectrumBin, SpectrumResult, TremorBand};
pub use statistics::{differences, SignalStatistics};

use signal_window::WindowError;
use thiserror::Error;

/// Errors raised while assembling feature datasets
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Row {row} has {actual} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown feature column: {0}")]
    UnknownColumn(String),

    #[error(transparent)]
    Window(#[from] WindowError),
}
