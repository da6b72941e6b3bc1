//! Status command - show a persisted job record.

use std::path::PathBuf;

use colored::Colorize;
use scrub::JobStatus;
use scrub::job::{FileStatus, read_record};

use super::CommandResult;

pub fn run(file: PathBuf, json_output: bool) -> CommandResult {
    if !file.exists() {
        return Err(format!("Job file not found: {}", file.display()).into());
    }

    let record = read_record(&file)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    let status = match record.status {
        JobStatus::Pending => "pending".white(),
        JobStatus::Processing => "processing".cyan(),
        JobStatus::Completed => "completed".green(),
        JobStatus::Failed => "failed".red(),
    };
    println!(
        "{} {} {}",
        "Job".cyan().bold(),
        record.job_id.white(),
        status.bold()
    );
    println!();

    // Progress bar
    let bar_width = 30;
    let filled = (usize::from(record.progress) * bar_width / 100).min(bar_width);
    let bar: String = "█".repeat(filled) + &"░".repeat(bar_width - filled);
    println!(
        "Progress: {} {}/{} ({}%)",
        bar.cyan(),
        record.files_processed.to_string().white().bold(),
        record.total_files,
        record.progress
    );
    if let Some(current) = &record.current_file {
        let stage = record.current_stage.as_deref().unwrap_or("starting");
        println!("Current:  {} ({})", current.white(), stage.dimmed());
    }
    println!();

    println!("{}", "Files:".yellow().bold());
    for file in &record.files {
        let state = match file.status {
            FileStatus::Pending => "pending".white(),
            FileStatus::Processing => "processing".cyan(),
            FileStatus::Completed => "completed".green(),
            FileStatus::Failed => "failed".red(),
        };
        println!("  {:30} {}", file.original_name, state);
        if let Some(error) = &file.error {
            println!("  {:30} {}", "", error.red());
        }
    }

    if !record.report.files.is_empty() {
        println!();
        println!("{}", "Corrections:".yellow().bold());
        for report in &record.report.files {
            println!(
                "  {:30} imputed {}, duplicates {}, outliers {}",
                report.filename,
                report.corrections.missing_imputed,
                report.corrections.duplicates_removed,
                report.corrections.outliers_handled
            );
        }
    }

    println!();
    println!("Created:  {}", record.created_at.to_rfc3339());
    println!("Updated:  {}", record.updated_at.to_rfc3339());
    if let Some(done) = record.completed_at {
        println!("Finished: {}", done.to_rfc3339());
    }

    Ok(())
}
