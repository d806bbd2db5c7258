//! In-memory representation of an uploaded CSV

use crate::error::{PipelineError, PipelineResult};
use serde::Serialize;
use std::io::Read;

/// Row-oriented table with named columns.
///
/// Cells keep their original text so the downloaded file reproduces the
/// upload verbatim, with prediction columns appended on the right.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from headers and rows. Short rows are padded with empty cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Parse a CSV document with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> PipelineResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
                h.to_string()
            })
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Parse CSV bytes (e.g. an uploaded file body).
    pub fn from_csv_bytes(bytes: &[u8]) -> PipelineResult<Self> {
        Self::from_csv_reader(bytes)
    }

    /// Serialize the table as UTF-8 CSV, header first.
    pub fn to_csv_bytes(&self) -> PipelineResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| PipelineError::Csv(csv::Error::from(e.into_error())))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell values of one column in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// Set a column by name, appending it when absent and overwriting otherwise.
    ///
    /// `values` must hold exactly one cell per row.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> PipelineResult<()> {
        if values.len() != self.rows.len() {
            return Err(PipelineError::prediction(
                "merge",
                format!(
                    "column '{}' has {} values for {} rows",
                    name,
                    values.len(),
                    self.rows.len()
                ),
            ));
        }

        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}
