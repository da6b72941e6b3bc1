//! Persistence for job records as JSON files.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, ScrubError};

use super::record::JobRecord;

/// Directory of job records, one `<job_id>.json` file per job.
#[derive(Debug, Clone)]
pub struct JobStore {
    dir: PathBuf,
}

impl JobStore {
    /// Open a store, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            ScrubError::Persistence(format!(
                "Failed to create directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for a job.
    pub fn path_for(&self, job_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", job_id))
    }

    /// Write a record, replacing any previous version.
    pub fn save(&self, record: &JobRecord) -> Result<PathBuf> {
        let path = self.path_for(&record.job_id);
        let staging = path.with_extension("json.tmp");

        let file = File::create(&staging).map_err(|e| {
            ScrubError::Persistence(format!(
                "Failed to create file '{}': {}",
                staging.display(),
                e
            ))
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, record).map_err(|e| {
            ScrubError::Persistence(format!("Failed to serialize job record: {}", e))
        })?;
        writer.flush().map_err(|e| {
            ScrubError::Persistence(format!("Failed to write '{}': {}", staging.display(), e))
        })?;
        fs::rename(&staging, &path).map_err(|e| {
            ScrubError::Persistence(format!(
                "Failed to write '{}': {}",
                path.display(),
                e
            ))
        })?;

        debug!(job_id = %record.job_id, status = ?record.status, "Job record saved");
        Ok(path)
    }

    /// Load a record by job id.
    pub fn load(&self, job_id: &str) -> Result<JobRecord> {
        let path = self.path_for(job_id);
        match File::open(&path) {
            Ok(file) => parse_record(file, &path),
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                Err(ScrubError::JobNotFound(job_id.to_string()))
            }
            Err(e) => Err(ScrubError::Persistence(format!(
                "Failed to open file '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    /// All stored records, oldest first.
    pub fn list(&self) -> Result<Vec<JobRecord>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            ScrubError::Persistence(format!(
                "Failed to read directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut records = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                records.push(read_record(&path)?);
            }
        }
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.job_id.cmp(&b.job_id)));
        Ok(records)
    }
}

/// Read a record from an arbitrary file.
pub fn read_record(path: impl AsRef<Path>) -> Result<JobRecord> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        ScrubError::Persistence(format!("Failed to open file '{}': {}", path.display(), e))
    })?;
    parse_record(file, path)
}

fn parse_record(file: File, path: &Path) -> Result<JobRecord> {
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        ScrubError::Persistence(format!(
            "Failed to parse job record '{}': {}",
            path.display(),
            e
        ))
    })
}
