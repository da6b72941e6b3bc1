//! Profile command - describe every column of a data file.

use std::path::PathBuf;

use colored::Colorize;
use scrub::{Parser, Profiler};

use super::CommandResult;

pub fn run(file: PathBuf, json_output: bool) -> CommandResult {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let (data, source) = Parser::new().parse_file(&file)?;
    let profile = Profiler::new().profile(&data);

    if json_output {
        let output = serde_json::json!({
            "source": source,
            "profile": profile,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Profile of".cyan().bold(),
        source.file.white()
    );
    println!(
        "{} rows, {} columns ({})",
        source.row_count.to_string().white().bold(),
        source.column_count.to_string().white().bold(),
        source.format
    );
    println!();
    println!(
        "  {:20} {:9} {:>8} {:>8} {:>8}",
        "column".yellow().bold(),
        "type".yellow().bold(),
        "missing".yellow().bold(),
        "unique".yellow().bold(),
        "dupes".yellow().bold()
    );

    for (name, column) in &profile.columns {
        let missing = format!("{:.1}%", column.missing_percentage);
        let missing = if column.missing_percentage > 0.0 {
            missing.red()
        } else {
            missing.normal()
        };
        println!(
            "  {:20} {:9} {:>8} {:>8} {:>8}",
            name,
            column.column_type.to_string(),
            missing,
            column.unique_count,
            column.duplicate_count
        );
        if let Some(stats) = &column.numeric {
            println!(
                "  {:20} {}",
                "",
                format!(
                    "min {} | q1 {} | median {} | q3 {} | max {} | mean {:.3} | sd {:.3}",
                    stats.min, stats.q1, stats.median, stats.q3, stats.max, stats.mean, stats.std_dev
                )
                .dimmed()
            );
        }
    }

    Ok(())
}
