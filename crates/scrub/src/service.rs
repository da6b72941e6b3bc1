//! File-level processing and multi-file jobs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::export::OutputFormat;
use crate::input::{Parser, SourceMetadata};
use crate::job::{JobFile, JobRecord, JobStore, NoopSink, ProgressSink};
use crate::pipeline::Pipeline;
use crate::queue::WorkQueue;
use crate::report::{CleansingReport, StepReport};
use crate::storage::{ArtifactStore, StoredArtifact};

/// Outcome of cleaning one file.
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    pub source: SourceMetadata,
    pub processed: StoredArtifact,
    pub report: CleansingReport,
    pub report_path: PathBuf,
}

/// Decodes a file, runs the pipeline and stores the results.
pub struct CleansingService {
    store: ArtifactStore,
    parser: Parser,
    format: OutputFormat,
}

impl CleansingService {
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            parser: Parser::new(),
            format: OutputFormat::default(),
        }
    }

    /// Set the encoding of cleaned files.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Clean one file. The report is stored under `report_key`.
    pub fn process_file(
        &self,
        path: impl AsRef<Path>,
        config: &PipelineConfig,
        report_key: &str,
    ) -> Result<ProcessedFile> {
        self.process_file_with_progress(path, config, report_key, &NoopSink)
    }

    /// Clean one file, reporting stage progress to `sink`.
    pub fn process_file_with_progress(
        &self,
        path: impl AsRef<Path>,
        config: &PipelineConfig,
        report_key: &str,
        sink: &dyn ProgressSink,
    ) -> Result<ProcessedFile> {
        let path = path.as_ref();
        info!(file = %path.display(), "Processing file");

        let (data, source) = self.parser.parse_file(path)?;
        let pipeline = Pipeline::new(config.clone())?;
        let (cleaned, report) = pipeline.run_with_progress(data, sink)?;

        let processed = self.store.save_processed(&cleaned, &source.file, self.format)?;
        let report_path = self.store.save_report(report_key, &report)?;

        info!(
            file = %path.display(),
            output = %processed.file_name,
            rows = report.final_summary.row_count,
            "File processed"
        );
        Ok(ProcessedFile {
            source,
            processed,
            report,
            report_path,
        })
    }
}

/// Runs multi-file jobs through the work queue, persisting job state.
pub struct JobProcessor {
    jobs: JobStore,
    service: Arc<CleansingService>,
    queue: WorkQueue,
}

impl JobProcessor {
    pub fn new(jobs: JobStore, service: CleansingService, queue: WorkQueue) -> Self {
        Self {
            jobs,
            service: Arc::new(service),
            queue,
        }
    }

    pub fn jobs(&self) -> &JobStore {
        &self.jobs
    }

    /// Clean every file under a freshly generated job id.
    pub async fn submit(&self, paths: Vec<PathBuf>, config: PipelineConfig) -> Result<JobRecord> {
        self.submit_with_id(JobRecord::generate_id(), paths, config).await
    }

    /// Clean every file as job `job_id` and return the final record.
    ///
    /// Configuration is validated before the job is created. Per-file
    /// failures are recorded on the job rather than returned.
    pub async fn submit_with_id(
        &self,
        job_id: String,
        paths: Vec<PathBuf>,
        config: PipelineConfig,
    ) -> Result<JobRecord> {
        config.validate()?;

        let files = paths
            .iter()
            .map(|p| JobFile::new(p.clone(), fs::metadata(p).map(|m| m.len()).unwrap_or(0)))
            .collect();
        let record = JobRecord::new(job_id.clone(), files);
        self.jobs.save(&record)?;
        info!(job_id = %job_id, files = paths.len(), "Job submitted");

        let shared = Arc::new(Mutex::new(record));
        let config = Arc::new(config);
        let multi = paths.len() > 1;

        let tasks: Vec<_> = paths
            .iter()
            .enumerate()
            .map(|(index, path)| {
                let task = FileTask {
                    path: path.clone(),
                    report_key: if multi {
                        format!("{}_{}", job_id, index + 1)
                    } else {
                        job_id.clone()
                    },
                    config: Arc::clone(&config),
                    service: Arc::clone(&self.service),
                    job: JobHandle {
                        record: Arc::clone(&shared),
                        jobs: self.jobs.clone(),
                    },
                    processed: OnceLock::new(),
                };
                move || task.run()
            })
            .collect();

        let outcomes = self.queue.run_all(tasks).await;

        let job = JobHandle {
            record: Arc::clone(&shared),
            jobs: self.jobs.clone(),
        };
        for (path, outcome) in paths.iter().zip(&outcomes) {
            if let Err(e) = outcome {
                warn!(job_id = %job_id, file = %path.display(), error = %e, "File failed");
                job.update(|r| r.mark_failed(path, e.to_string()))?;
            }
        }

        let record = job.snapshot();
        info!(job_id = %job_id, status = ?record.status, "Job finished");
        Ok(record)
    }
}

/// Shared, persisted job record.
#[derive(Clone)]
struct JobHandle {
    record: Arc<Mutex<JobRecord>>,
    jobs: JobStore,
}

impl JobHandle {
    /// Apply a change and persist the record while holding the lock.
    fn update(&self, change: impl FnOnce(&mut JobRecord)) -> Result<()> {
        let mut record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        change(&mut *record);
        self.jobs.save(&record)?;
        Ok(())
    }

    fn snapshot(&self) -> JobRecord {
        self.record.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ProgressSink for JobHandle {
    fn stage_started(&self, stage: &str, _index: usize, _total: usize) {
        if let Err(e) = self.update(|r| r.set_stage(stage)) {
            warn!(error = %e, "Failed to record stage progress");
        }
    }

    fn stage_completed(&self, step: &StepReport, index: usize, total: usize) {
        debug!(stage = %step.name, step = index + 1, total, "Stage completed");
    }
}

/// One file of a job, runnable (and re-runnable) on the work queue.
struct FileTask {
    path: PathBuf,
    report_key: String,
    config: Arc<PipelineConfig>,
    service: Arc<CleansingService>,
    job: JobHandle,
    /// Output of a cleaning attempt whose record update failed to save.
    processed: OnceLock<ProcessedFile>,
}

impl FileTask {
    fn run(&self) -> Result<ProcessedFile> {
        let processed = match self.processed.get() {
            Some(processed) => processed,
            None => {
                self.job.update(|r| r.mark_processing(&self.path))?;
                let processed = self.service.process_file_with_progress(
                    &self.path,
                    &self.config,
                    &self.report_key,
                    &self.job,
                )?;
                self.processed.get_or_init(|| processed)
            }
        };
        self.job.update(|r| {
            r.mark_completed(&self.path, processed.processed.path.clone(), &processed.report)
        })?;
        Ok(processed.clone())
    }
}
