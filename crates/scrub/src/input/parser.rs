//! CSV/TSV decoder with delimiter detection.

use std::collections::HashSet;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::dataset::{Dataset, Row, Value};
use crate::error::{Result, ScrubError};

use super::source::SourceMetadata;

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Decodes delimited text into a [`Dataset`].
///
/// The first record is the header. Every cell decodes to text; short rows
/// are padded with empty cells and long rows truncated to the header width.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the dataset and source metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(Dataset, SourceMetadata)> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|e| ScrubError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let hash = format!("sha256:{:x}", Sha256::digest(&contents));
        let delimiter = self.delimiter_for(&contents)?;
        let data = self.parse_with(&contents, delimiter)?;

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            contents.len() as u64,
            format_name(delimiter).to_string(),
            data.len(),
            data.column_count(),
        );
        debug!(
            file = %metadata.file,
            rows = metadata.row_count,
            columns = metadata.column_count,
            format = %metadata.format,
            "Parsed source file"
        );

        Ok((data, metadata))
    }

    /// Parse in-memory bytes.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Dataset> {
        let delimiter = self.delimiter_for(bytes)?;
        self.parse_with(bytes, delimiter)
    }

    fn delimiter_for(&self, bytes: &[u8]) -> Result<u8> {
        match self.config.delimiter {
            Some(d) => Ok(d),
            None => detect_delimiter(bytes),
        }
    }

    fn parse_with(&self, bytes: &[u8], delimiter: u8) -> Result<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.trim().to_string()).collect();
        if headers.iter().all(String::is_empty) {
            return Err(ScrubError::MalformedInput("No header row found".to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = headers.iter().find(|h| !seen.insert(h.as_str())) {
            return Err(ScrubError::MalformedInput(format!(
                "Duplicate column name '{}'",
                dup
            )));
        }

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            if self.config.max_rows.is_some_and(|max| row_idx >= max) {
                break;
            }

            let record = result.map_err(|e| ScrubError::Parse {
                row: row_idx + 1,
                message: e.to_string(),
            })?;
            let row: Row = headers
                .iter()
                .enumerate()
                .map(|(i, name)| (name.as_str(), Value::text(record.get(i).unwrap_or(""))))
                .collect();
            rows.push(row);
        }

        Ok(Dataset::new(rows))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn format_name(delimiter: u8) -> &'static str {
    match delimiter {
        b'\t' => "tsv",
        b',' => "csv",
        b';' => "csv-semicolon",
        b'|' => "psv",
        _ => "delimited",
    }
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let lines: Vec<String> = BufReader::new(bytes)
        .lines()
        .take(10)
        .map_while(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(ScrubError::MalformedInput("No header row found".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        let variance =
            counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64;

        // Higher count with lower variance wins; tabs get a small bonus.
        let score = if consistent {
            first_count * 1000 + if delim == b'\t' { 100 } else { 0 }
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_detect_delimiter_csv() {
        let data = b"a,b,c\n1,2,3\n4,5,6";
        assert_eq!(detect_delimiter(data).unwrap(), b',');
    }

    #[test]
    fn test_detect_delimiter_tsv() {
        let data = b"a\tb\tc\n1\t2\t3\n4\t5\t6";
        assert_eq!(detect_delimiter(data).unwrap(), b'\t');
    }

    #[test]
    fn test_detect_ignores_quoted_commas() {
        let data = b"name;note\n\"Smith, J\";ok\n\"Doe, A\";fine";
        assert_eq!(detect_delimiter(data).unwrap(), b';');
    }

    #[test]
    fn test_parse_csv() {
        let data = Parser::new()
            .parse_bytes(b" name ,age,city\nAlice,30,NYC\nBob,25,LA")
            .unwrap();

        assert_eq!(data.columns(), vec!["name", "age", "city"]);
        assert_eq!(data.len(), 2);
        assert_eq!(data.rows()[0].value("name"), &Value::text("Alice"));
        assert_eq!(data.rows()[1].value("age"), &Value::text("25"));
    }

    #[test]
    fn test_ragged_rows_are_normalized() {
        let data = Parser::new()
            .parse_bytes(b"a,b,c\n1,2\n4,5,6,7\n")
            .unwrap();

        assert_eq!(data.rows()[0].value("c"), &Value::text(""));
        assert_eq!(data.rows()[1].len(), 3);
        assert!(data.check_consistent().is_ok());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let data = Parser::new().parse_bytes(b"a,b\n\n1,2\n\n3,4\n").unwrap();
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn test_header_only_is_empty_dataset() {
        let data = Parser::new().parse_bytes(b"a,b,c\n").unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_empty_input_is_malformed() {
        let err = Parser::new().parse_bytes(b"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        let err = Parser::new().parse_bytes(b"\n  \n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_duplicate_headers_rejected() {
        let err = Parser::new().parse_bytes(b"a,a\n1,2\n").unwrap_err();
        assert!(matches!(err, ScrubError::MalformedInput(_)));
    }

    #[test]
    fn test_max_rows() {
        let parser = Parser::with_config(ParserConfig {
            max_rows: Some(1),
            ..Default::default()
        });
        assert_eq!(parser.parse_bytes(b"a\n1\n2\n3\n").unwrap().len(), 1);
    }

    #[test]
    fn test_parse_file_metadata() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("people.tsv");
        fs::write(&path, "name\tage\nAlice\t30\n").unwrap();

        let (data, meta) = Parser::new().parse_file(&path).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(meta.file, "people.tsv");
        assert_eq!(meta.format, "tsv");
        assert_eq!(meta.column_count, 2);
        assert!(meta.hash.starts_with("sha256:"));
        assert_eq!(meta.size_bytes, 18);
    }
}
