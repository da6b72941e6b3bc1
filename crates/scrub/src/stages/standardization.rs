//! Per-cell text and date normalization.

use std::borrow::Cow;
use std::fmt::Write as _;

use chrono::NaiveDateTime;

use crate::config::{DateFormat, PipelineConfig, StandardizationConfig, TextCase};
use crate::dataset::{Dataset, Value};
use crate::error::{Result, ScrubError};
use crate::formats;

use super::{Metric, Stage, StageChanges, StageResult};

/// Trims, case-folds, reformats dates and strips special characters.
///
/// Rules run in that order on every non-null cell. Trimming counts a
/// correction only when the value changed; case folding, date reformatting
/// and character stripping count one correction each time they run.
pub struct StandardizationStage;

impl StandardizationStage {
    pub fn new() -> Self {
        Self
    }

    /// Standardize one cell, returning the new value and corrections made.
    fn standardize(&self, value: &Value, settings: &StandardizationConfig) -> Result<(String, usize)> {
        let mut corrections = 0;
        let mut text = value.to_string();

        if settings.trim_whitespace {
            let trimmed = text.trim();
            if trimmed.len() != text.len() {
                text = trimmed.to_string();
                corrections += 1;
            }
        }

        match settings.text {
            TextCase::Lowercase => {
                text = text.to_lowercase();
                corrections += 1;
            }
            TextCase::Uppercase => {
                text = text.to_uppercase();
                corrections += 1;
            }
            TextCase::Unset => {}
        }

        if let Some(format) = settings.date_format() {
            if let Some(date) = formats::parse_date(&text) {
                text = format_date(date, &format)?;
                corrections += 1;
            }
        }

        if settings.remove_special_chars {
            text = strip_special_chars(&text).into_owned();
            corrections += 1;
        }

        Ok((text, corrections))
    }
}

impl Default for StandardizationStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for StandardizationStage {
    fn name(&self) -> &'static str {
        "Data Standardization"
    }

    fn apply(&self, mut data: Dataset, config: &PipelineConfig) -> Result<StageResult> {
        let mut changes = StageChanges::with_metrics(&[Metric::ValuesCorrected]);
        let settings = &config.standardization;

        for row in data.rows_mut() {
            for (_, cell) in row.iter_mut() {
                if cell.is_null() {
                    continue;
                }
                let (text, corrections) = self.standardize(cell, settings)?;
                if corrections > 0 {
                    *cell = Value::Text(text);
                    changes.add(Metric::ValuesCorrected, corrections);
                }
            }
        }

        Ok(StageResult::new(data, changes))
    }
}

fn format_date(date: NaiveDateTime, format: &DateFormat) -> Result<String> {
    let layout = match format {
        DateFormat::Iso8601 => "%Y-%m-%dT%H:%M:%S%.3fZ",
        DateFormat::Custom(layout) => layout.as_str(),
    };
    let mut text = String::new();
    write!(text, "{}", date.format(layout)).map_err(|_| {
        ScrubError::Config(format!(
            "standardization.dates: cannot render '{}' with format '{}'",
            date, layout
        ))
    })?;
    Ok(text)
}

/// Keep only ASCII letters, digits and whitespace.
fn strip_special_chars(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_plain_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| is_plain_char(*c)).collect())
    }
}

fn is_plain_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace()
}
