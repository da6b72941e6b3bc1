//! Outlier detection and treatment for numeric columns.

use tracing::debug;

use crate::config::{OutlierMethod, OutlierStrategy, OutliersConfig, PipelineConfig};
use crate::dataset::{Dataset, Value};
use crate::error::Result;
use crate::profile::{NumericStatistics, Profiler};

use super::{Metric, Stage, StageChanges, StageResult};

/// Columns with at least this share of missing values are not examined.
const MAX_MISSING_PERCENTAGE: f64 = 50.0;

/// Z-score magnitude above which a value is an outlier.
const Z_SCORE_LIMIT: f64 = 3.0;

/// Suffix of the boolean column added by the flag strategy.
pub const FLAG_SUFFIX: &str = "_outlier";

/// Detects numeric outliers and removes, caps or flags them.
///
/// Candidate columns come from a profile of the stage input. Each column
/// is then treated in turn against the current data, so rows removed for
/// one column no longer count towards the next column's bounds.
pub struct OutliersStage {
    profiler: Profiler,
}

impl OutliersStage {
    pub fn new() -> Self {
        Self {
            profiler: Profiler::new(),
        }
    }

    fn treat_column(
        &self,
        data: &mut Dataset,
        column: &str,
        settings: &OutliersConfig,
        changes: &mut StageChanges,
    ) {
        let numbers: Vec<(usize, f64)> = data
            .column_values(column)
            .enumerate()
            .filter_map(|(idx, v)| v.to_number().map(|n| (idx, n)))
            .collect();
        let values: Vec<f64> = numbers.iter().map(|(_, n)| *n).collect();
        let Some(stats) = NumericStatistics::from_values(&values) else {
            return;
        };

        let (lower, upper) = bounds(&stats, settings);
        let mut flagged = vec![false; data.len()];
        let mut found = 0;
        for (idx, n) in &numbers {
            if *n < lower || *n > upper {
                flagged[*idx] = true;
                found += 1;
            }
        }
        if found == 0 {
            return;
        }
        changes.add(Metric::OutliersFound, found);
        debug!(column, found, lower, upper, "Outliers detected");

        match settings.strategy {
            OutlierStrategy::Remove => {
                let before = data.len();
                let mut flags = flagged.into_iter();
                data.retain(|_| !flags.next().unwrap_or(false));
                changes.add(Metric::OutliersRemoved, found);
                changes.add(Metric::RowsRemoved, before - data.len());
            }
            OutlierStrategy::Cap => {
                for (idx, n) in numbers {
                    if flagged[idx] {
                        data.rows_mut()[idx].set(column, Value::Number(n.clamp(lower, upper)));
                        changes.increment(Metric::OutliersCapped);
                    }
                }
            }
            OutlierStrategy::Flag => {
                let flag_column = format!("{}{}", column, FLAG_SUFFIX);
                for (row, is_outlier) in data.rows_mut().iter_mut().zip(flagged) {
                    row.set(flag_column.as_str(), Value::Bool(is_outlier));
                }
            }
        }
    }
}

impl Default for OutliersStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for OutliersStage {
    fn name(&self) -> &'static str {
        "Outlier Detection & Treatment"
    }

    fn apply(&self, mut data: Dataset, config: &PipelineConfig) -> Result<StageResult> {
        let mut changes = StageChanges::with_metrics(&[
            Metric::OutliersFound,
            Metric::OutliersRemoved,
            Metric::OutliersCapped,
            Metric::RowsRemoved,
        ]);
        if data.is_empty() {
            return Ok(StageResult::new(data, changes));
        }

        let profile = self.profiler.profile(&data);
        let candidates: Vec<&str> = profile
            .numeric_columns()
            .filter(|(_, p)| p.missing_percentage < MAX_MISSING_PERCENTAGE)
            .map(|(name, _)| name)
            .collect();

        for column in candidates {
            self.treat_column(&mut data, column, &config.outliers, &mut changes);
        }

        Ok(StageResult::new(data, changes))
    }
}

/// Inclusive range of acceptable values for a column.
fn bounds(stats: &NumericStatistics, settings: &OutliersConfig) -> (f64, f64) {
    match settings.method {
        OutlierMethod::Iqr => stats.iqr_bounds(settings.threshold),
        OutlierMethod::Zscore => {
            let spread = Z_SCORE_LIMIT * stats.std_dev;
            (stats.mean - spread, stats.mean + spread)
        }
    }
}
