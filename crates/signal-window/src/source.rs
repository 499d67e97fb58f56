//! Pull-Based Sample Sources

use crate::{SampleTable, SensorSample, WindowError};
use std::io::Write;
use thiserror::Error;
use tracing::{debug, info};

/// Errors reported by a sample source
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    /// No reading has arrived yet; poll again later
    #[error("Sensor data not yet available")]
    NotYetAvailable,

    /// The device went away
    #[error("Sensor disconnected: {0}")]
    Disconnected(String),
}

/// Anything that can hand out the most recent sensor snapshot
pub trait SampleSource {
    /// Latest reading, or `SourceError::NotYetAvailable` before the first one
    fn latest(&mut self) -> Result<SensorSample, SourceError>;
}

/// Append-only log of snapshots pulled from a `SampleSource`
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    samples: Vec<SensorSample>,
}

impl SessionLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Pull one snapshot. Returns `Ok(false)` when the source has nothing yet.
    pub fn poll<S: SampleSource + ?Sized>(&mut self, source: &mut S) -> Result<bool, SourceError> {
        match source.latest() {
            Ok(sample) => {
                self.samples.push(sample);
                Ok(true)
            }
            Err(SourceError::NotYetAvailable) => {
                debug!("Sample not yet available, caller should retry");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Append a snapshot directly
    pub fn push(&mut self, sample: SensorSample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[SensorSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All values of one named column (see `SensorSample::COLUMNS`)
    pub fn axis(&self, name: &str) -> Option<Vec<f64>> {
        self.samples.iter().map(|s| s.axis(name)).collect()
    }

    /// Convert into a column table for the feature pipeline
    pub fn to_table(&self) -> SampleTable {
        let headers: Vec<String> = SensorSample::COLUMNS.iter().map(|c| c.to_string()).collect();
        let mut columns = vec![Vec::with_capacity(self.samples.len()); headers.len()];
        for sample in &self.samples {
            for (column, value) in columns.iter_mut().zip(sample.to_row()) {
                column.push(value);
            }
        }
        SampleTable::new(headers, columns).unwrap_or_default()
    }

    /// Write the log as CSV with a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), WindowError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(SensorSample::COLUMNS)?;
        for sample in &self.samples {
            csv_writer.write_record(sample.to_row().iter().map(|v| v.to_string()))?;
        }
        csv_writer.flush()?;
        info!("Wrote {} samples", self.samples.len());
        Ok(())
    }
}
