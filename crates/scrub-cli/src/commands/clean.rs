//! Clean command - run files through the pipeline as one job.

use std::path::PathBuf;

use colored::Colorize;
use scrub::job::{FileStatus, JobRecord};
use scrub::{
    ArtifactStore, CleansingService, JobProcessor, JobStatus, JobStore, OutputFormat,
    PipelineConfig, RetryPolicy, WorkQueue,
};
use tracing::debug;

use super::CommandResult;

const JOBS_DIR: &str = "jobs";

pub struct CleanArgs {
    pub files: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub jobs: usize,
    pub retries: u32,
    pub job_id: Option<String>,
}

pub fn run(args: CleanArgs) -> CommandResult {
    let config = match &args.config {
        Some(path) => PipelineConfig::read(path)?,
        None => PipelineConfig::default(),
    }
    .with_env_overrides()?;
    debug!(?config, "Loaded configuration");

    let store = ArtifactStore::open(&args.output_dir)?;
    let jobs = JobStore::open(args.output_dir.join(JOBS_DIR))?;
    let queue = WorkQueue::new(args.jobs).with_retry(RetryPolicy {
        attempts: args.retries.max(1),
        ..RetryPolicy::default()
    });
    let processor = JobProcessor::new(
        jobs,
        CleansingService::new(store).with_format(args.format),
        queue,
    );

    println!(
        "{} {} file(s)",
        "Cleaning".cyan().bold(),
        args.files.len().to_string().white()
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let job_id = args.job_id.unwrap_or_else(JobRecord::generate_id);
    let record = runtime.block_on(processor.submit_with_id(job_id, args.files, config))?;

    print_summary(&record, &processor);

    if record.status == JobStatus::Failed {
        let failed = record
            .files
            .iter()
            .filter(|f| f.status == FileStatus::Failed)
            .count();
        return Err(format!("{} of {} file(s) failed", failed, record.total_files).into());
    }
    Ok(())
}

fn print_summary(record: &JobRecord, processor: &JobProcessor) {
    println!();
    for file in &record.files {
        match file.status {
            FileStatus::Completed => {
                println!("{} {}", "✓".green().bold(), file.original_name.white());
                if let Some(report) = record
                    .report
                    .files
                    .iter()
                    .find(|r| r.filename == file.original_name)
                {
                    println!(
                        "    rows {} → {}, columns {} → {}",
                        report.original.row_count,
                        report.cleaned.row_count.to_string().white().bold(),
                        report.original.column_count,
                        report.cleaned.column_count.to_string().white().bold()
                    );
                    println!(
                        "    imputed {}, duplicates removed {}, outliers handled {}",
                        report.corrections.missing_imputed.to_string().yellow(),
                        report.corrections.duplicates_removed.to_string().yellow(),
                        report.corrections.outliers_handled.to_string().yellow()
                    );
                }
                if let Some(path) = &file.processed_path {
                    println!("    {}", path.display().to_string().dimmed());
                }
            }
            FileStatus::Failed => {
                println!("{} {}", "✗".red().bold(), file.original_name.white());
                if let Some(error) = &file.error {
                    println!("    {}", error.red());
                }
            }
            FileStatus::Pending | FileStatus::Processing => {
                println!("{} {}", "?".yellow().bold(), file.original_name.white());
            }
        }
    }

    println!();
    let status = match record.status {
        JobStatus::Completed => "completed".green().bold(),
        JobStatus::Failed => "failed".red().bold(),
        _ => "incomplete".yellow().bold(),
    };
    println!(
        "Job {} {} ({}/{} files)",
        record.job_id.cyan(),
        status,
        record.files_processed,
        record.total_files
    );
    println!(
        "Record: {}",
        processor
            .jobs()
            .path_for(&record.job_id)
            .display()
            .to_string()
            .white()
    );
}

