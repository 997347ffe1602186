//! IO utilities for loading tabular transaction data.

pub mod csv_reader;

pub use csv_reader::{load_data, load_data_with_config, CsvReaderConfig};
