//! Config command - write the default pipeline configuration.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;
use scrub::PipelineConfig;

use super::CommandResult;

pub fn run(output: Option<PathBuf>) -> CommandResult {
    let json = serde_json::to_string_pretty(&PipelineConfig::default())?;

    match output {
        Some(path) => {
            fs::write(&path, format!("{}\n", json))?;
            eprintln!(
                "{} {}",
                "Wrote default configuration to".green().bold(),
                path.display().to_string().white()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}
