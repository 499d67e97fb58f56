//! Feature Datasets

use crate::features::{FeatureField, FeatureVector};
use crate::FeatureError;
use serde::{Deserialize, Serialize};

/// Rows of feature values sharing one ordered column set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureDataset {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
    labels: Vec<Option<String>>,
}

impl FeatureDataset {
    /// Build from raw rows; every row must have one value per column
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, FeatureError> {
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(FeatureError::RaggedRow {
                    row: idx,
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
        }
        let labels = vec![None; rows.len()];
        Ok(Self { columns, rows, labels })
    }

    /// Empty dataset with the full feature schema
    pub fn empty() -> Self {
        Self::with_fields(&FeatureField::ALL)
    }

    /// Empty dataset over a subset of feature fields
    pub fn with_fields(fields: &[FeatureField]) -> Self {
        Self {
            columns: fields.iter().map(|f| f.name().to_string()).collect(),
            rows: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Dataset over the full feature schema
    pub fn from_vectors(vectors: &[FeatureVector]) -> Self {
        Self::from_vectors_with(vectors, &FeatureField::ALL)
    }

    /// Dataset keeping only `fields`, in that order
    pub fn from_vectors_with(vectors: &[FeatureVector], fields: &[FeatureField]) -> Self {
        Self {
            columns: fields.iter().map(|f| f.name().to_string()).collect(),
            rows: vectors
                .iter()
                .map(|v| fields.iter().map(|f| v.get(*f)).collect())
                .collect(),
            labels: vectors.iter().map(|v| v.label.clone()).collect(),
        }
    }

    /// Append a feature vector; every column must name a feature field
    pub fn push(&mut self, vector: &FeatureVector) -> Result<(), FeatureError> {
        let row = self
            .columns
            .iter()
            .map(|c| vector.value_of(c).ok_or_else(|| FeatureError::UnknownColumn(c.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        self.rows.push(row);
        self.labels.push(vector.label.clone());
        Ok(())
    }

    /// Project onto `columns`, in the given order
    pub fn select(&self, columns: &[&str]) -> Result<Self, FeatureError> {
        let indices = columns
            .iter()
            .map(|c| self.column_index(c).ok_or_else(|| FeatureError::UnknownColumn(c.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i]).collect())
                .collect(),
            labels: self.labels.clone(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<&[f64]> {
        self.rows.get(idx).map(Vec::as_slice)
    }

    pub fn labels(&self) -> &[Option<String>] {
        &self.labels
    }

    pub fn num_features(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(peak: f64, taps: f64) -> FeatureVector {
        FeatureVector {
            peak_freq: peak,
            tap_count: taps,
            ..Default::default()
        }
    }

    #[test]
    fn test_full_schema_from_vectors() {
        let dataset = FeatureDataset::from_vectors(&[vector(5.0, 0.0), vector(0.0, 12.0).with_label("tap")]);
        assert_eq!(dataset.num_features(), 7);
        assert_eq!(dataset.columns()[0], "peak_freq");
        assert_eq!(dataset.row(1).unwrap()[4], 12.0);
        assert_eq!(dataset.labels()[1].as_deref(), Some("tap"));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = FeatureDataset::new(vec!["a".into(), "b".into()], vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(FeatureError::RaggedRow { row: 1, .. })));
    }

    #[test]
    fn test_select_reorders_columns() {
        let dataset = FeatureDataset::from_vectors(&[vector(5.0, 3.0)]);
        let selected = dataset.select(&["tap_count", "peak_freq"]).unwrap();
        assert_eq!(selected.row(0).unwrap(), &[3.0, 5.0]);
        assert!(dataset.select(&["missing"]).is_err());
    }

    #[test]
    fn test_push_follows_column_order() {
        let mut dataset = FeatureDataset::with_fields(&FeatureField::TAPPING);
        dataset.push(&vector(5.0, 9.0)).unwrap();
        assert_eq!(dataset.row(0).unwrap(), &[9.0, 0.0, 0.0]);

        let mut foreign = FeatureDataset::new(vec!["x".into()], Vec::new()).unwrap();
        assert!(matches!(foreign.push(&vector(1.0, 1.0)), Err(FeatureError::UnknownColumn(_))));
    }
}
