//! Training dataset ingestion
//!
//! Reads a headered CSV source, checks the header against the feature schema
//! before any row is touched, then coerces each row through the same rules
//! used for single-record inference.

use crate::error::{ReadinessError, Result};
use crate::schema::{coerce_row, validate_columns, LabeledRow, NUM_FEATURES};
use ndarray::{Array1, Array2};
use serde_json::Value;
use std::io::Read;

/// Ordered collection of labeled examples
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<LabeledRow>,
}

impl Dataset {
    pub fn from_rows(rows: Vec<LabeledRow>) -> Self {
        Self { rows }
    }

    /// Parse a headered CSV source.
    ///
    /// Missing columns are reported before the first data row is read. Row
    /// numbers in cell errors are 1-based and exclude the header.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let index = {
            let headers = csv_reader.headers()?;
            validate_columns(headers.iter())?
        };

        let mut rows = Vec::new();
        for (i, record) in csv_reader.records().enumerate() {
            let record = record?;
            let cells: Vec<Value> = record
                .iter()
                .map(|cell| Value::String(cell.to_string()))
                .collect();
            rows.push(coerce_row(&cells, &index, i + 1)?);
        }

        Ok(Self { rows })
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_csv_reader(bytes)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[LabeledRow] {
        &self.rows
    }

    /// Feature matrix and label vector for the given row indices
    pub fn to_matrices(&self, indices: &[usize]) -> Result<(Array2<f64>, Array1<f64>)> {
        let mut flat = Vec::with_capacity(indices.len() * NUM_FEATURES);
        let mut labels = Vec::with_capacity(indices.len());
        for &i in indices {
            let row = &self.rows[i];
            flat.extend_from_slice(&row.features.to_array());
            labels.push(if row.placed { 1.0 } else { 0.0 });
        }

        let x = Array2::from_shape_vec((indices.len(), NUM_FEATURES), flat)
            .map_err(|e| ReadinessError::training(format!("Failed to build feature matrix: {}", e)))?;
        Ok((x, Array1::from(labels)))
    }
}
