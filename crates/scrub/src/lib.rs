//! Scrub: a configurable cleansing pipeline for tabular datasets.
//!
//! A dataset is a sequence of rows mapping column names to scalar values.
//! The pipeline threads it through five stages in a fixed order and records
//! what each stage changed:
//!
//! 1. **Standardization**: trim, case-fold, reformat dates
//! 2. **Validation**: enforce per-column rules, dropping failing rows
//! 3. **Missing data**: drop sparse columns and impute the rest
//! 4. **Duplicates**: remove exact or fuzzy repeats
//! 5. **Outliers**: remove, cap or flag numeric outliers
//!
//! # Example
//!
//! ```
//! use scrub::{Dataset, PipelineConfig, Row, Value};
//!
//! let data: Dataset = vec![
//!     [("age", "30")].into_iter().collect::<Row>(),
//!     [("age", "")].into_iter().collect::<Row>(),
//!     [("age", "35")].into_iter().collect::<Row>(),
//! ]
//! .into_iter()
//! .collect();
//!
//! let (cleaned, report) = scrub::run(data, &PipelineConfig::default()).unwrap();
//! assert_eq!(cleaned.rows()[1].value("age"), &Value::Number(32.5));
//! assert_eq!(report.final_summary.values_corrected, 4);
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod formats;
pub mod input;
pub mod job;
pub mod pipeline;
pub mod profile;
pub mod queue;
pub mod report;
pub mod service;
pub mod stages;
pub mod storage;

pub use config::PipelineConfig;
pub use dataset::{Dataset, Row, Value};
pub use error::{ErrorKind, Result, ScrubError};
pub use export::{OutputFormat, Writer};
pub use input::{Parser, SourceMetadata};
pub use job::{JobRecord, JobStatus, JobStore, ProgressSink};
pub use pipeline::{Pipeline, run};
pub use profile::{ColumnProfile, ColumnType, DatasetProfile, Profiler};
pub use queue::{RetryPolicy, WorkQueue};
pub use report::CleansingReport;
pub use service::{CleansingService, JobProcessor, ProcessedFile};
pub use stages::{Metric, Stage, StageChanges, StageResult};
pub use storage::{ArtifactStore, StoredArtifact};
