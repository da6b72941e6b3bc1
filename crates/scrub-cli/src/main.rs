//! Scrub CLI - clean tabular data files through a configurable pipeline.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};
use logging::LogConfig;

fn main() {
    let cli = Cli::parse();
    logging::init_logging(&LogConfig::from_verbosity(cli.verbose, cli.log_format));

    let result = match cli.command {
        Commands::Clean {
            files,
            config,
            output_dir,
            format,
            jobs,
            retries,
            job_id,
        } => commands::clean::run(commands::clean::CleanArgs {
            files,
            config,
            output_dir,
            format,
            jobs,
            retries,
            job_id,
        }),

        Commands::Profile { file, json } => commands::profile::run(file, json),

        Commands::Status { file, json } => commands::status::run(file, json),

        Commands::Config { output } => commands::config::run(output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
