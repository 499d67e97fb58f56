//! Column-Oriented Sample Tables

use crate::{RawSignal, WindowError};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Known spellings of the acceleration axis used for tremor analysis
pub const ACCEL_X_ALIASES: [&str; 5] = ["accel_x", "Accel_X", "ACCEL_X", "acceleration_x", "ax"];

/// Known spellings of the timestamp column (seconds)
pub const TIMESTAMP_ALIASES: [&str; 4] = ["timestamp", "Timestamp", "time", "t"];

/// First cell of a column that did not parse as a number
#[derive(Debug, Clone, PartialEq)]
struct InvalidCell {
    row: usize,
    value: String,
}

/// A batch of raw samples stored column by column.
///
/// Columns that are not fully numeric (e.g. button states logged as
/// `True`/`False`) are kept by name but only fail when they are read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleTable {
    headers: Vec<String>,
    columns: Vec<Vec<f64>>,
    /// Per column, the first unparseable cell
    invalid: Vec<Option<InvalidCell>>,
    rows: usize,
}

impl SampleTable {
    /// Build a table from named columns of equal length
    pub fn new(headers: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self, WindowError> {
        if headers.len() != columns.len() {
            return Err(WindowError::InvalidConfig(format!(
                "{} headers for {} columns",
                headers.len(),
                columns.len()
            )));
        }
        let expected = columns.first().map(Vec::len).unwrap_or(0);
        for (name, column) in headers.iter().zip(&columns) {
            if column.len() != expected {
                return Err(WindowError::RaggedTable {
                    column: name.clone(),
                    expected,
                    actual: column.len(),
                });
            }
        }
        Ok(Self {
            invalid: vec![None; headers.len()],
            headers,
            columns,
            rows: expected,
        })
    }

    /// Parse CSV with a header row. Non-numeric cells only mark their
    /// column as unreadable.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, WindowError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        let mut columns = vec![Vec::new(); headers.len()];
        let mut invalid: Vec<Option<InvalidCell>> = vec![None; headers.len()];
        let mut rows = 0;

        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            for (col, field) in record.iter().enumerate() {
                let (Some(column), Some(bad)) = (columns.get_mut(col), invalid.get_mut(col)) else {
                    continue;
                };
                if bad.is_some() {
                    continue;
                }
                match field.parse::<f64>() {
                    Ok(value) => column.push(value),
                    Err(_) => {
                        *bad = Some(InvalidCell {
                            row,
                            value: field.to_string(),
                        });
                        column.clear();
                    }
                }
            }
            rows += 1;
        }

        let skipped: Vec<&str> = headers
            .iter()
            .zip(&invalid)
            .filter(|(_, bad)| bad.is_some())
            .map(|(name, _)| name.as_str())
            .collect();
        if !skipped.is_empty() {
            debug!("Non-numeric columns left unparsed: {:?}", skipped);
        }
        debug!("Parsed {} columns x {} rows", headers.len(), rows);

        Ok(Self {
            headers,
            columns,
            invalid,
            rows,
        })
    }

    /// Read a CSV file from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, WindowError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        info!("Loaded {} samples from {}", table.len(), path.display());
        Ok(table)
    }

    /// Numeric values of column `idx`, or the first cell that failed to parse
    fn numeric(&self, idx: usize) -> Result<&[f64], WindowError> {
        match &self.invalid[idx] {
            Some(cell) => Err(WindowError::InvalidValue {
                column: self.headers[idx].clone(),
                row: cell.row,
                value: cell.value.clone(),
            }),
            None => Ok(self.columns[idx].as_slice()),
        }
    }

    /// Column names in file order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values of the column with exactly this name; `None` when absent or
    /// not numeric
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let idx = self.headers.iter().position(|h| h == name)?;
        self.numeric(idx).ok()
    }

    /// First column matching one of `aliases`, tried in alias order.
    /// A matching column with a non-numeric cell is `InvalidValue`.
    pub fn find_column(&self, aliases: &[&str]) -> Result<(&str, &[f64]), WindowError> {
        for alias in aliases {
            if let Some(idx) = self.headers.iter().position(|h| h == alias) {
                return Ok((self.headers[idx].as_str(), self.numeric(idx)?));
            }
        }
        Err(WindowError::ColumnNotFound {
            wanted: aliases.iter().map(|a| a.to_string()).collect(),
            available: self.headers.clone(),
        })
    }

    /// Sample rate inferred from the timestamp column, if present and increasing
    pub fn inferred_sample_rate(&self) -> Option<f64> {
        let (_, times) = self.find_column(&TIMESTAMP_ALIASES).ok()?;
        let (first, last) = (times.first()?, times.last()?);
        let span = last - first;
        if times.len() < 2 || !(span > 0.0) {
            return None;
        }
        Some((times.len() - 1) as f64 / span)
    }

    /// Extract the acceleration axis as a signal at the given rate
    pub fn accel_signal(&self, sample_rate_hz: f64) -> Result<RawSignal, WindowError> {
        let (name, values) = self.find_column(&ACCEL_X_ALIASES)?;
        debug!("Using column {} as the acceleration axis", name);
        RawSignal::new(values.to_vec(), sample_rate_hz)
    }
}
