//! Type inference and descriptive statistics over a dataset snapshot.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::dataset::{Dataset, Value};
use crate::formats;

use super::column::{ColumnProfile, DatasetProfile, NumericStatistics};
use super::types::ColumnType;

/// Default number of non-missing values sampled for type inference.
pub const DEFAULT_SAMPLE_SIZE: usize = 100;

/// Computes per-column profiles. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct Profiler {
    /// Maximum non-missing values sampled per column for type inference.
    sample_size: usize,
}

impl Profiler {
    /// Create a profiler with the default sample size.
    pub fn new() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    /// Create a profiler sampling at most `sample_size` values per column.
    pub fn with_sample_size(sample_size: usize) -> Self {
        Self { sample_size }
    }

    /// Profile every column of a dataset.
    ///
    /// Columns are taken from the first row; an empty dataset yields an
    /// empty profile.
    pub fn profile(&self, data: &Dataset) -> DatasetProfile {
        let columns: IndexMap<String, ColumnProfile> = data
            .columns()
            .into_iter()
            .map(|name| {
                let profile = self.profile_column(data, &name);
                (name, profile)
            })
            .collect();

        DatasetProfile {
            row_count: data.len(),
            columns,
        }
    }

    /// Profile a single column.
    pub fn profile_column(&self, data: &Dataset, column: &str) -> ColumnProfile {
        let (missing, present): (Vec<&Value>, Vec<&Value>) =
            data.column_values(column).partition(|v| v.is_missing());

        let missing_count = missing.len();
        let missing_percentage = if data.is_empty() {
            0.0
        } else {
            missing_count as f64 / data.len() as f64 * 100.0
        };

        let distinct: HashSet<String> = present.iter().map(|v| v.to_string()).collect();
        let unique_count = distinct.len();

        let sample: Vec<&Value> = present.iter().copied().take(self.sample_size).collect();
        let column_type = self.infer_type(&sample);

        let numbers: Vec<f64> = present.iter().filter_map(|v| v.to_number()).collect();

        ColumnProfile {
            column_type,
            missing_count,
            missing_percentage,
            unique_count,
            duplicate_count: present.len() - unique_count,
            numeric: NumericStatistics::from_values(&numbers),
        }
    }

    /// Infer the column type from a sample of non-missing values.
    pub fn infer_type(&self, sample: &[&Value]) -> ColumnType {
        if sample.is_empty() {
            return ColumnType::String;
        }

        if sample.iter().all(|v| v.to_number().is_some()) {
            ColumnType::Numeric
        } else if sample.iter().all(|v| v.to_date().is_some()) {
            ColumnType::Date
        } else if sample.iter().all(|v| v.to_bool().is_some()) {
            ColumnType::Boolean
        } else if sample.iter().all(|v| is_email_value(v)) {
            ColumnType::Email
        } else {
            ColumnType::String
        }
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

fn is_email_value(value: &Value) -> bool {
    matches!(value, Value::Text(s) if formats::is_email(s))
}
