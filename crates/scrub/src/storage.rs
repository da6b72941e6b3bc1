//! Content-addressed storage for cleaned datasets and reports.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{Result, ScrubError};
use crate::export::{OutputFormat, Writer};
use crate::report::CleansingReport;

const PROCESSED_DIR: &str = "processed";
const REPORTS_DIR: &str = "reports";

/// Hex digits of the content hash used in stored file names.
const HASH_PREFIX_LEN: usize = 12;

/// A cleaned dataset written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredArtifact {
    pub path: PathBuf,
    pub file_name: String,
    /// Full SHA-256 of the written bytes, hex encoded.
    pub hash: String,
    pub size_bytes: u64,
}

/// Output directory with `processed/` and `reports/` subdirectories.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open a store, creating its directories if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [root.join(PROCESSED_DIR), root.join(REPORTS_DIR)] {
            fs::create_dir_all(&dir).map_err(|e| ScrubError::Io {
                path: dir.clone(),
                source: e,
            })?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a stored file name inside `processed/`.
    pub fn processed_path(&self, file_name: &str) -> PathBuf {
        self.root.join(PROCESSED_DIR).join(file_name)
    }

    /// Path of the report for a job.
    pub fn report_path(&self, job_id: &str) -> PathBuf {
        self.root.join(REPORTS_DIR).join(format!("{}_report.json", job_id))
    }

    /// Encode and store a cleaned dataset.
    ///
    /// The file is named `cleaned_<hash>_<original stem>.<ext>`, so storing
    /// identical content twice yields the same path.
    pub fn save_processed(
        &self,
        data: &Dataset,
        original_name: &str,
        format: OutputFormat,
    ) -> Result<StoredArtifact> {
        let bytes = Writer::new(format).encode(data)?;
        let hash = format!("{:x}", Sha256::digest(&bytes));

        let stem = Path::new(original_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());
        let file_name = format!(
            "cleaned_{}_{}.{}",
            &hash[..HASH_PREFIX_LEN],
            stem,
            format.extension()
        );
        let path = self.processed_path(&file_name);

        fs::write(&path, &bytes).map_err(|e| ScrubError::Io {
            path: path.clone(),
            source: e,
        })?;
        debug!(file = %file_name, bytes = bytes.len(), "Stored cleaned dataset");

        Ok(StoredArtifact {
            path,
            file_name,
            hash,
            size_bytes: bytes.len() as u64,
        })
    }

    /// Write a report as pretty JSON to `reports/<job_id>_report.json`.
    pub fn save_report(&self, job_id: &str, report: &CleansingReport) -> Result<PathBuf> {
        let path = self.report_path(job_id);
        let json = serde_json::to_vec_pretty(report).map_err(|e| {
            ScrubError::Persistence(format!("Failed to serialize report: {}", e))
        })?;
        fs::write(&path, json).map_err(|e| ScrubError::Io {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }
}
