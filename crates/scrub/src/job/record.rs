//! Job records tracking a multi-file cleansing request.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::report::{CleansingReport, FinalSummary, OriginalSummary};
use crate::stages::Metric;

const MISSING_STAGE: &str = "Missing Data Handler";
const DUPLICATES_STAGE: &str = "Duplicate Detection & Removal";
const OUTLIERS_STAGE: &str = "Outlier Detection & Treatment";

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Lifecycle state of one file within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

/// An input file belonging to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFile {
    pub original_name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub processed_path: Option<PathBuf>,
    pub size_bytes: u64,
    #[serde(default)]
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobFile {
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        let path = path.into();
        let original_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            original_name,
            path,
            processed_path: None,
            size_bytes,
            status: FileStatus::Pending,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileIssues {
    pub missing_values: usize,
    pub duplicates: usize,
    pub outliers: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCorrections {
    pub missing_imputed: usize,
    pub duplicates_removed: usize,
    /// Outliers removed or capped; flagged outliers are not counted.
    pub outliers_handled: usize,
}

/// Per-file summary kept on the job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub filename: String,
    pub original: OriginalSummary,
    pub cleaned: FinalSummary,
    pub issues: FileIssues,
    pub corrections: FileCorrections,
}

impl FileReport {
    /// Summarize a cleansing report, reading counters by stage name.
    pub fn from_report(filename: impl Into<String>, report: &CleansingReport) -> Self {
        let count = |stage: &str, metric: Metric| {
            report
                .steps
                .iter()
                .find(|s| s.name == stage)
                .map(|s| s.changes.get(metric))
                .unwrap_or(0)
        };

        Self {
            filename: filename.into(),
            original: report.original.clone(),
            cleaned: report.final_summary.clone(),
            issues: FileIssues {
                missing_values: count(MISSING_STAGE, Metric::ValuesCorrected),
                duplicates: count(DUPLICATES_STAGE, Metric::DuplicatesFound),
                outliers: count(OUTLIERS_STAGE, Metric::OutliersFound),
            },
            corrections: FileCorrections {
                missing_imputed: count(MISSING_STAGE, Metric::ValuesCorrected),
                duplicates_removed: count(DUPLICATES_STAGE, Metric::RowsRemoved),
                outliers_handled: count(OUTLIERS_STAGE, Metric::OutliersRemoved)
                    + count(OUTLIERS_STAGE, Metric::OutliersCapped),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub files: Vec<FileReport>,
}

/// Persistent state of a cleansing job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub job_id: String,
    pub status: JobStatus,
    pub files: Vec<JobFile>,
    /// Percentage of files completed, 0–100.
    pub progress: u8,
    pub total_files: usize,
    pub files_processed: usize,
    pub current_file: Option<String>,
    pub current_stage: Option<String>,
    pub report: JobReport,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Create a pending job over the given files.
    pub fn new(job_id: impl Into<String>, files: Vec<JobFile>) -> Self {
        let now = Utc::now();
        Self {
            job_id: job_id.into(),
            status: JobStatus::Pending,
            total_files: files.len(),
            files,
            progress: 0,
            files_processed: 0,
            current_file: None,
            current_stage: None,
            report: JobReport::default(),
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Generate a fresh job id such as `job_20240115T093000_3f9a1c2e`.
    pub fn generate_id() -> String {
        format!(
            "job_{}_{:08x}",
            Utc::now().format("%Y%m%dT%H%M%S"),
            fastrand::u32(..)
        )
    }

    fn file_mut(&mut self, path: &Path) -> Option<&mut JobFile> {
        self.files.iter_mut().find(|f| f.path == path)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// A file has started processing. Completed files are left alone.
    pub fn mark_processing(&mut self, path: &Path) {
        if let Some(file) = self.file_mut(path) {
            if file.status == FileStatus::Completed {
                return;
            }
            file.status = FileStatus::Processing;
            let name = file.original_name.clone();
            self.current_file = Some(name);
        }
        if self.status == JobStatus::Pending {
            self.status = JobStatus::Processing;
        }
        self.touch();
    }

    /// Record the stage currently running.
    pub fn set_stage(&mut self, stage: &str) {
        self.current_stage = Some(stage.to_string());
        self.touch();
    }

    /// A file finished successfully. Repeating the call is a no-op.
    pub fn mark_completed(&mut self, path: &Path, processed_path: PathBuf, report: &CleansingReport) {
        let Some(file) = self.file_mut(path) else {
            return;
        };
        if file.status == FileStatus::Completed {
            return;
        }
        file.status = FileStatus::Completed;
        file.processed_path = Some(processed_path);
        let name = file.original_name.clone();

        self.files_processed += 1;
        self.progress = percentage(self.files_processed, self.total_files);
        self.report.files.push(FileReport::from_report(name, report));
        self.settle();
        self.touch();
    }

    /// A file failed. The job as a whole is marked failed.
    pub fn mark_failed(&mut self, path: &Path, message: impl Into<String>) {
        let message = message.into();
        if let Some(file) = self.file_mut(path) {
            file.status = FileStatus::Failed;
            file.error = Some(message.clone());
        }
        self.status = JobStatus::Failed;
        self.error = Some(message);
        self.settle();
        self.touch();
    }

    /// True once every file has completed or failed.
    pub fn is_finished(&self) -> bool {
        self.files
            .iter()
            .all(|f| matches!(f.status, FileStatus::Completed | FileStatus::Failed))
    }

    fn settle(&mut self) {
        if !self.is_finished() {
            return;
        }
        if self.status != JobStatus::Failed {
            self.status = JobStatus::Completed;
        }
        self.current_file = None;
        self.current_stage = None;
        self.completed_at = Some(Utc::now());
    }
}

fn percentage(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round().min(100.0) as u8
}
