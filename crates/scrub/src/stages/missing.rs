//! Missing-value imputation and sparse-column removal.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::config::{CategoricalMethod, MissingDataConfig, MissingStrategy, NumericMethod, PipelineConfig};
use crate::dataset::{Dataset, Value};
use crate::error::Result;
use crate::profile::{ColumnProfile, Profiler};

use super::{Metric, Stage, StageChanges, StageResult};

/// Sentinel used by [`CategoricalMethod::Unknown`].
pub const UNKNOWN: &str = "Unknown";

/// Drops columns above the missing threshold and imputes the rest.
///
/// Decisions are made against a profile of the stage input; dropped
/// columns are removed only after every column has been evaluated.
pub struct MissingDataStage {
    profiler: Profiler,
}

impl MissingDataStage {
    pub fn new() -> Self {
        Self {
            profiler: Profiler::new(),
        }
    }

    /// Value used to fill gaps in a column, if one can be computed.
    fn fill_value(
        &self,
        data: &Dataset,
        column: &str,
        profile: &ColumnProfile,
        settings: &MissingDataConfig,
    ) -> Option<Value> {
        if profile.column_type.is_numeric() {
            let stats = profile.numeric.as_ref()?;
            let fill = match settings.numeric_method {
                NumericMethod::Median => stats.median,
                NumericMethod::Mean => stats.mean,
            };
            return Some(Value::Number(fill));
        }

        match settings.categorical_method {
            CategoricalMethod::Mode => mode(data.column_values(column).filter(|v| !v.is_missing())),
            CategoricalMethod::Unknown => {
                (profile.missing_count < data.len()).then(|| Value::text(UNKNOWN))
            }
        }
    }
}

impl Default for MissingDataStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for MissingDataStage {
    fn name(&self) -> &'static str {
        "Missing Data Handler"
    }

    fn apply(&self, mut data: Dataset, config: &PipelineConfig) -> Result<StageResult> {
        let mut changes = StageChanges::with_metrics(&[
            Metric::ValuesCorrected,
            Metric::RowsRemoved,
            Metric::ColumnsRemoved,
        ]);
        if data.is_empty() {
            return Ok(StageResult::new(data, changes));
        }

        let settings = &config.missing_data;
        if settings.strategy != MissingStrategy::Impute {
            warn!(
                strategy = ?settings.strategy,
                "Only imputation is supported for missing data; imputing"
            );
        }

        let profile = self.profiler.profile(&data);
        let mut to_drop = Vec::new();

        for (column, info) in &profile.columns {
            if info.missing_percentage > settings.drop_column_threshold {
                debug!(
                    column = %column,
                    missing = info.missing_percentage,
                    "Dropping sparse column"
                );
                to_drop.push(column.clone());
                continue;
            }
            if info.missing_count == 0 {
                continue;
            }

            let Some(fill) = self.fill_value(&data, column, info, settings) else {
                debug!(column = %column, "No values to impute from");
                continue;
            };

            for row in data.rows_mut() {
                if row.value(column).is_missing() {
                    row.set(column.as_str(), fill.clone());
                }
            }
            changes.add(Metric::ValuesCorrected, info.missing_count);
        }

        changes.add(Metric::ColumnsRemoved, to_drop.len());
        data.drop_columns(&to_drop);

        Ok(StageResult::new(data, changes))
    }
}

/// Most frequent value by string form; ties go to the first seen.
fn mode<'a>(values: impl Iterator<Item = &'a Value>) -> Option<Value> {
    let mut counts: IndexMap<String, (usize, &Value)> = IndexMap::new();
    for value in values {
        counts.entry(value.to_string()).or_insert((0, value)).0 += 1;
    }

    let mut best: Option<(usize, &Value)> = None;
    for (count, value) in counts.into_values() {
        if best.is_none_or(|(top, _)| count > top) {
            best = Some((count, value));
        }
    }
    best.map(|(_, value)| value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Row;

    fn dataset(column: &str, values: &[&str]) -> Dataset {
        values
            .iter()
            .map(|v| std::iter::once((column, *v)).collect::<Row>())
            .collect()
    }

    fn column(data: &Dataset, name: &str) -> Vec<Value> {
        data.column_values(name).cloned().collect()
    }

    #[test]
    fn test_median_imputation() {
        let result = MissingDataStage::new()
            .apply(dataset("age", &["30", "", "35"]), &PipelineConfig::default())
            .unwrap();

        assert_eq!(
            column(&result.data, "age"),
            vec![Value::text("30"), Value::Number(32.5), Value::text("35")]
        );
        assert_eq!(result.changes.get(Metric::ValuesCorrected), 1);
        assert_eq!(result.changes.get(Metric::ColumnsRemoved), 0);
    }

    #[test]
    fn test_mean_imputation() {
        let mut config = PipelineConfig::default();
        config.missing_data.numeric_method = NumericMethod::Mean;
        let result = MissingDataStage::new()
            .apply(dataset("x", &["1", "2", "NA", "9"]), &config)
            .unwrap();
        assert_eq!(column(&result.data, "x")[2], Value::Number(4.0));
    }

    #[test]
    fn test_mean_of_huge_values_is_finite() {
        let mut config = PipelineConfig::default();
        config.missing_data.numeric_method = NumericMethod::Mean;
        let result = MissingDataStage::new()
            .apply(dataset("x", &["1e308", "1.5e308", ""]), &config)
            .unwrap();
        let imputed = column(&result.data, "x")[2].to_number().unwrap();
        assert!((imputed / 1.25e308 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mode_ties_go_to_first_seen() {
        let result = MissingDataStage::new()
            .apply(
                dataset("city", &["LA", "NYC", "", "NYC", "LA"]),
                &PipelineConfig::default(),
            )
            .unwrap();
        assert_eq!(column(&result.data, "city")[2], Value::text("LA"));
    }

    #[test]
    fn test_unknown_sentinel() {
        let mut config = PipelineConfig::default();
        config.missing_data.categorical_method = CategoricalMethod::Unknown;
        let result = MissingDataStage::new()
            .apply(dataset("city", &["LA", "null", "NYC"]), &config)
            .unwrap();
        assert_eq!(column(&result.data, "city")[1], Value::text(UNKNOWN));
    }

    #[test]
    fn test_threshold_is_strict() {
        // Two of four missing is exactly 50%.
        let at = dataset("x", &["a", "", "b", ""]);
        let result = MissingDataStage::new().apply(at, &PipelineConfig::default()).unwrap();
        assert_eq!(result.data.columns(), vec!["x"]);
        assert_eq!(result.changes.get(Metric::ValuesCorrected), 2);

        let above = dataset("x", &["a", "", "", ""]);
        let result = MissingDataStage::new().apply(above, &PipelineConfig::default()).unwrap();
        assert!(result.data.columns().is_empty());
        assert_eq!(result.changes.get(Metric::ColumnsRemoved), 1);
        assert_eq!(result.data.len(), 4);
    }

    #[test]
    fn test_all_missing_column_left_alone_when_kept() {
        let mut config = PipelineConfig::default();
        config.missing_data.drop_column_threshold = 100.0;
        let result = MissingDataStage::new()
            .apply(dataset("x", &["", "NA"]), &config)
            .unwrap();
        assert_eq!(column(&result.data, "x"), vec![Value::text(""), Value::text("NA")]);
        assert_eq!(result.changes.get(Metric::ValuesCorrected), 0);
    }

    #[test]
    fn test_drop_uses_original_profile() {
        let data: Dataset = vec![
            [("keep", "1"), ("sparse", "")].into_iter().collect::<Row>(),
            [("keep", ""), ("sparse", "")].into_iter().collect::<Row>(),
            [("keep", "3"), ("sparse", "z")].into_iter().collect::<Row>(),
        ]
        .into_iter()
        .collect();
        let result = MissingDataStage::new().apply(data, &PipelineConfig::default()).unwrap();

        assert_eq!(result.data.columns(), vec!["keep"]);
        assert_eq!(column(&result.data, "keep")[1], Value::Number(2.0));
    }

    #[test]
    fn test_second_run_is_noop() {
        let stage = MissingDataStage::new();
        let config = PipelineConfig::default();
        let first = stage
            .apply(dataset("x", &["1", "", "5", "x"]), &config)
            .unwrap();
        let second = stage.apply(first.data.clone(), &config).unwrap();

        assert_eq!(second.data, first.data);
        assert_eq!(second.changes.get(Metric::ValuesCorrected), 0);
    }

    #[test]
    fn test_other_strategies_still_impute() {
        let mut config = PipelineConfig::default();
        config.missing_data.strategy = MissingStrategy::Remove;
        let result = MissingDataStage::new()
            .apply(dataset("x", &["1", "", "3"]), &config)
            .unwrap();
        assert_eq!(result.data.len(), 3);
        assert_eq!(result.changes.get(Metric::RowsRemoved), 0);
        assert_eq!(result.changes.get(Metric::ValuesCorrected), 1);
    }
}
