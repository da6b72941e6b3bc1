//! Encoding datasets back to delimited text or JSON.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{Result, ScrubError};

/// Output encoding for cleaned datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    /// A JSON array of row objects.
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Json => "json",
        }
    }

    fn delimiter(&self) -> Option<u8> {
        match self {
            OutputFormat::Csv => Some(b','),
            OutputFormat::Tsv => Some(b'\t'),
            OutputFormat::Json => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ScrubError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            "json" => Ok(OutputFormat::Json),
            other => Err(ScrubError::Config(format!("Unknown output format '{}'", other))),
        }
    }
}

/// Encodes datasets in one output format.
///
/// Columns follow the first row's order. Nulls become empty fields,
/// numbers use their shortest round-trip form and booleans are written as
/// `true`/`false`.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    format: OutputFormat,
}

impl Writer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Encode a dataset to bytes. A dataset without rows cannot be written.
    pub fn encode(&self, data: &Dataset) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Err(ScrubError::EmptyDatasetResult(
                "Cleaned dataset has no rows to write".to_string(),
            ));
        }

        match self.format.delimiter() {
            Some(delimiter) => encode_delimited(data, delimiter),
            None => serde_json::to_vec_pretty(data).map_err(encode_failure),
        }
    }

    /// Encode a dataset and write it to `path`.
    pub fn write_file(&self, data: &Dataset, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        let bytes = self.encode(data)?;
        fs::write(path, &bytes).map_err(|e| ScrubError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(bytes.len() as u64)
    }
}

fn encode_delimited(data: &Dataset, delimiter: u8) -> Result<Vec<u8>> {
    let columns = data.columns();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer.write_record(&columns).map_err(encode_failure)?;
    for row in data {
        writer
            .write_record(columns.iter().map(|c| row.value(c).to_string()))
            .map_err(encode_failure)?;
    }

    writer
        .into_inner()
        .map_err(|e| ScrubError::Persistence(format!("Failed to flush encoded table: {}", e)))
}

/// Output that cannot be encoded is a write failure, not bad input.
fn encode_failure(e: impl fmt::Display) -> ScrubError {
    ScrubError::Persistence(format!("Failed to encode output: {}", e))
}
