//! Signal Windowing
//!
//! Provides raw single-axis motion signals, fixed-length overlapping window
//! segmentation, and the tabular and pull-based boundaries through which raw
//! sensor samples enter the pipeline.

mod source;
mod table;
mod window;

pub use source::{SampleSource, SessionLog, SourceError};
pub use table::{SampleTable, ACCEL_X_ALIASES, TIMESTAMP_ALIASES};
pub use window::{Segments, Window, WindowConfig, WindowIter, Windower};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building signals or windows
#[derive(Debug, Error)]
pub enum WindowError {
    #[error("Sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f64),

    #[error("Invalid window configuration: {0}")]
    InvalidConfig(String),

    #[error("Signal of {len} samples is shorter than one window of {window_samples} samples")]
    SignalTooShort { len: usize, window_samples: usize },

    #[error("No column matching {wanted:?} found; available columns: {available:?}")]
    ColumnNotFound {
        wanted: Vec<String>,
        available: Vec<String>,
    },

    #[error("Invalid value {value:?} in column {column} at row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Column {column} has {actual} rows, expected {expected}")]
    RaggedTable {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One snapshot of the motion sensor (acceleration in g, gyration in deg/s)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// Seconds since the start of the session
    pub timestamp: f64,
    /// Acceleration along X (g)
    pub accel_x: f64,
    /// Acceleration along Y (g)
    pub accel_y: f64,
    /// Acceleration along Z (g)
    pub accel_z: f64,
    /// Angular rate around X (deg/s)
    pub gyro_x: f64,
    /// Angular rate around Y (deg/s)
    pub gyro_y: f64,
    /// Angular rate around Z (deg/s)
    pub gyro_z: f64,
}

impl SensorSample {
    /// Column names in the order they are logged
    pub const COLUMNS: [&'static str; 7] = [
        "timestamp", "accel_x", "accel_y", "accel_z", "gyro_x", "gyro_y", "gyro_z",
    ];

    /// Look up a value by its column name
    pub fn axis(&self, name: &str) -> Option<f64> {
        match name {
            "timestamp" => Some(self.timestamp),
            "accel_x" => Some(self.accel_x),
            "accel_y" => Some(self.accel_y),
            "accel_z" => Some(self.accel_z),
            "gyro_x" => Some(self.gyro_x),
            "gyro_y" => Some(self.gyro_y),
            "gyro_z" => Some(self.gyro_z),
            _ => None,
        }
    }

    /// Values in `COLUMNS` order
    pub fn to_row(&self) -> [f64; 7] {
        [
            self.timestamp,
            self.accel_x,
            self.accel_y,
            self.accel_z,
            self.gyro_x,
            self.gyro_y,
            self.gyro_z,
        ]
    }
}

/// Ordered samples of one sensor axis paired with their sample rate.
///
/// The sample sequence may be empty; the sample rate is always positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSignal {
    samples: Vec<f64>,
    sample_rate_hz: f64,
}

impl RawSignal {
    /// Create a signal, rejecting non-positive or non-finite sample rates
    pub fn new(samples: Vec<f64>, sample_rate_hz: f64) -> Result<Self, WindowError> {
        if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
            return Err(WindowError::InvalidSampleRate(sample_rate_hz));
        }
        Ok(Self {
            samples,
            sample_rate_hz,
        })
    }

    /// Raw sample values
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Sample rate (Hz)
    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Covered duration in seconds
    pub fn duration_sec(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate_hz
    }
}
