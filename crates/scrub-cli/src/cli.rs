//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use scrub::OutputFormat;

/// Scrub: configurable cleansing pipeline for tabular data
#[derive(Parser)]
#[command(name = "scrub")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Pretty)]
    pub log_format: LogFormatArg,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean one or more data files as a single job
    Clean {
        /// Data files to clean (CSV/TSV)
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Pipeline configuration (JSON); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory receiving processed files, reports and job records
        #[arg(short, long, default_value = "scrub-output")]
        output_dir: PathBuf,

        /// Encoding of cleaned files
        #[arg(short, long, default_value = "csv")]
        format: OutputFormat,

        /// Files processed concurrently
        #[arg(short, long, default_value_t = scrub::queue::DEFAULT_CONCURRENCY)]
        jobs: usize,

        /// Attempts per file, including the first
        #[arg(long, default_value = "3")]
        retries: u32,

        /// Use this job id instead of generating one
        #[arg(long)]
        job_id: Option<String>,
    },

    /// Print the descriptive profile of a data file
    Profile {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a persisted job record
    Status {
        /// Path to a job record (<job_id>.json)
        #[arg(value_name = "JOB_FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the default pipeline configuration
    Config {
        /// Output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_clean() {
        let cli = Cli::try_parse_from([
            "scrub", "-vv", "clean", "a.csv", "b.csv", "--format", "tsv", "--jobs", "2",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Clean {
                files, format, jobs, ..
            } => {
                assert_eq!(files.len(), 2);
                assert_eq!(format, OutputFormat::Tsv);
                assert_eq!(jobs, 2);
            }
            _ => panic!("expected clean"),
        }
    }

    #[test]
    fn test_clean_requires_files() {
        assert!(Cli::try_parse_from(["scrub", "clean"]).is_err());
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Cli::try_parse_from(["scrub", "clean", "a.csv", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_log_format() {
        let cli = Cli::try_parse_from(["scrub", "--log-format", "json", "config"]).unwrap();
        assert_eq!(cli.log_format, LogFormatArg::Json);
    }
}
