//! The structured record of one pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::profile::DatasetProfile;
use crate::stages::{Metric, StageChanges};

/// Shape and profile of the dataset before any stage ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalSummary {
    pub row_count: usize,
    pub column_count: usize,
    pub profile: DatasetProfile,
}

/// One executed stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub name: String,
    pub changes: StageChanges,
    pub timestamp: DateTime<Utc>,
}

/// Shape, profile and summed counters after the last stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalSummary {
    pub row_count: usize,
    pub column_count: usize,
    pub columns_removed: usize,
    pub rows_removed: usize,
    pub values_corrected: usize,
    /// Sum of every step's `duplicatesFound`.
    pub duplicates_removed: usize,
    pub outliers_found: usize,
    pub profile: DatasetProfile,
}

/// Report produced by a complete pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleansingReport {
    pub original: OriginalSummary,
    pub steps: Vec<StepReport>,
    #[serde(rename = "final")]
    pub final_summary: FinalSummary,
}

impl CleansingReport {
    /// Sum a metric across all steps.
    pub fn total(&self, metric: Metric) -> usize {
        sum_steps(&self.steps, metric)
    }
}

fn sum_steps(steps: &[StepReport], metric: Metric) -> usize {
    steps.iter().map(|s| s.changes.get(metric)).sum()
}

/// Accumulates steps while a run is in progress.
#[derive(Debug)]
pub(crate) struct ReportBuilder {
    original: OriginalSummary,
    steps: Vec<StepReport>,
}

impl ReportBuilder {
    pub(crate) fn new(data: &Dataset, profile: DatasetProfile) -> Self {
        Self {
            original: OriginalSummary {
                row_count: data.len(),
                column_count: data.column_count(),
                profile,
            },
            steps: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, name: &str, changes: StageChanges) -> &StepReport {
        self.steps.push(StepReport {
            name: name.to_string(),
            changes,
            timestamp: Utc::now(),
        });
        &self.steps[self.steps.len() - 1]
    }

    pub(crate) fn finish(self, data: &Dataset, profile: DatasetProfile) -> CleansingReport {
        let final_summary = FinalSummary {
            row_count: data.len(),
            column_count: data.column_count(),
            columns_removed: sum_steps(&self.steps, Metric::ColumnsRemoved),
            rows_removed: sum_steps(&self.steps, Metric::RowsRemoved),
            values_corrected: sum_steps(&self.steps, Metric::ValuesCorrected),
            duplicates_removed: sum_steps(&self.steps, Metric::DuplicatesFound),
            outliers_found: sum_steps(&self.steps, Metric::OutliersFound),
            profile,
        };

        CleansingReport {
            original: self.original,
            steps: self.steps,
            final_summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Row;

    #[test]
    fn test_totals_sum_steps() {
        let data: Dataset = vec![std::iter::once(("a", "1")).collect::<Row>()]
            .into_iter()
            .collect();
        let mut builder = ReportBuilder::new(&data, DatasetProfile::default());

        let mut first = StageChanges::with_metrics(&[Metric::RowsRemoved, Metric::DuplicatesFound]);
        first.add(Metric::RowsRemoved, 2);
        first.add(Metric::DuplicatesFound, 2);
        builder.record("one", first);

        let mut second = StageChanges::with_metrics(&[Metric::RowsRemoved]);
        second.add(Metric::RowsRemoved, 3);
        builder.record("two", second);

        let report = builder.finish(&data, DatasetProfile::default());
        assert_eq!(report.final_summary.rows_removed, 5);
        assert_eq!(report.final_summary.duplicates_removed, 2);
        assert_eq!(report.final_summary.outliers_found, 0);
        assert_eq!(report.total(Metric::RowsRemoved), 5);
        assert_eq!(report.original.column_count, 1);
    }

    #[test]
    fn test_serialized_shape() {
        let data = Dataset::default();
        let mut builder = ReportBuilder::new(&data, DatasetProfile::default());
        builder.record("Data Standardization", StageChanges::with_metrics(&[Metric::ValuesCorrected]));
        let json = serde_json::to_value(builder.finish(&data, DatasetProfile::default())).unwrap();

        assert_eq!(json["original"]["rowCount"], 0);
        assert_eq!(json["steps"][0]["name"], "Data Standardization");
        assert_eq!(json["steps"][0]["changes"]["valuesCorrected"], 0);
        assert!(json["steps"][0]["timestamp"].is_string());
        assert_eq!(json["final"]["duplicatesRemoved"], 0);
        assert!(json["final"]["profile"]["columns"].is_object());
    }
}
