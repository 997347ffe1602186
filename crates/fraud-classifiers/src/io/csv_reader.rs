//! Delimited-text reader producing a numeric [`Dataset`].
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;

use crate::data_handling::Dataset;
use ndarray::Array2;

/// Configuration for reading delimited feature files.
#[derive(Debug, Clone)]
pub struct CsvReaderConfig {
    /// Field delimiter (`b','` for CSV, `b'\t'` for TSV).
    pub delimiter: u8,
    /// Trim whitespace around headers and fields before parsing.
    pub trim: bool,
}

impl Default for CsvReaderConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: true,
        }
    }
}

/// Read a comma-delimited file with a header row into a [`Dataset`].
pub fn load_data<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    load_data_with_config(path, &CsvReaderConfig::default())
}

/// Read a delimited file using a custom configuration.
///
/// Every field must parse as `f64`; the first malformed value aborts the read
/// with its row number and column name attached.
pub fn load_data_with_config<P: AsRef<Path>>(path: P, config: &CsvReaderConfig) -> Result<Dataset> {
    let trim = if config.trim {
        csv::Trim::All
    } else {
        csv::Trim::None
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .trim(trim)
        .from_path(&path)
        .with_context(|| format!("Failed to open data file: {}", path.as_ref().display()))?;

    let headers = reader
        .headers()
        .context("Failed to read header row")?
        .clone();
    if headers.is_empty() {
        return Err(anyhow!(
            "No columns found in header of {}",
            path.as_ref().display()
        ));
    }
    let columns = header_names(&headers);
    let n_columns = columns.len();

    let mut values = Vec::new();
    let mut n_rows = 0usize;
    for (row_idx, result) in reader.records().enumerate() {
        // Row numbers in messages are 1-based data rows (header excluded).
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        for (col_idx, field) in record.iter().enumerate() {
            let parsed = field.parse::<f64>().with_context(|| {
                format!(
                    "Invalid value '{}' in column '{}' at row {}",
                    field,
                    columns[col_idx],
                    row_idx + 1
                )
            })?;
            values.push(parsed);
        }
        n_rows += 1;
    }

    let records = Array2::from_shape_vec((n_rows, n_columns), values)
        .context("Failed to build data matrix")?;
    log::info!(
        "Loaded {} rows x {} columns from {}",
        n_rows,
        n_columns,
        path.as_ref().display()
    );

    Dataset::new(columns, records)
}

fn header_names(headers: &StringRecord) -> Vec<String> {
    headers.iter().map(|h| h.to_string()).collect()
}
