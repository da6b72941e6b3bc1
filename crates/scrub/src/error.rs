//! Error types for the scrub library.

use std::path::PathBuf;
use thiserror::Error;

/// Broad class of a [`ScrubError`].
///
/// Configuration errors are fatal for a run and never worth retrying;
/// malformed input is reported back to whoever supplied the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    InvalidConfiguration,
    EmptyDatasetResult,
    Io,
    Persistence,
}

/// Main error type for scrub operations.
#[derive(Debug, Error)]
pub enum ScrubError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error parsing tabular data.
    #[error("Parse error at row {row}: {message}")]
    Parse { row: usize, message: String },

    /// A row does not expose the same column set as the first row.
    #[error("Row {row} has columns {found:?}, expected {expected:?}")]
    InconsistentColumns {
        row: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Source table could not be understood.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Out-of-range or type-mismatched configuration option.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A validation pattern failed to compile.
    #[error("Invalid pattern for column '{column}': {source}")]
    Regex {
        column: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration JSON could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stage produced zero rows where at least one is required.
    #[error("Empty dataset: {0}")]
    EmptyDatasetResult(String),

    /// Error saving or loading persisted records.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// No job record exists with the given id.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Work queue failure (worker panicked or was cancelled).
    #[error("Queue error: {0}")]
    Queue(String),
}

impl ScrubError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScrubError::Csv(_)
            | ScrubError::Parse { .. }
            | ScrubError::InconsistentColumns { .. }
            | ScrubError::MalformedInput(_) => ErrorKind::MalformedInput,
            ScrubError::Config(_) | ScrubError::Regex { .. } | ScrubError::Json(_) => {
                ErrorKind::InvalidConfiguration
            }
            ScrubError::EmptyDatasetResult(_) => ErrorKind::EmptyDatasetResult,
            ScrubError::Io { .. } | ScrubError::Queue(_) => ErrorKind::Io,
            ScrubError::Persistence(_) | ScrubError::JobNotFound(_) => ErrorKind::Persistence,
        }
    }

    /// Whether running the same work again could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Io | ErrorKind::Persistence)
    }
}

/// Result type alias for scrub operations.
pub type Result<T> = std::result::Result<T, ScrubError>;
