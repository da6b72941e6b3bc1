//! Column and dataset profiles.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::stats;
use super::types::ColumnType;

/// Statistics for numeric values of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    /// First quartile (25th percentile).
    pub q1: f64,
    /// Second quartile (50th percentile).
    pub q2: f64,
    /// Third quartile (75th percentile).
    pub q3: f64,
}

impl NumericStatistics {
    /// Compute statistics over finite values; `None` for an empty sample.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = stats::sorted(values);
        let min = *sorted.first()?;
        let max = *sorted.last()?;
        let median = stats::quantile_sorted(&sorted, 0.5)?;
        Some(Self {
            min,
            max,
            mean: stats::mean(values)?,
            median,
            std_dev: stats::std_dev(values)?,
            q1: stats::quantile_sorted(&sorted, 0.25)?,
            q2: median,
            q3: stats::quantile_sorted(&sorted, 0.75)?,
        })
    }

    /// Calculate the interquartile range.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Bounds `[Q1 - k·IQR, Q3 + k·IQR]`.
    pub fn iqr_bounds(&self, multiplier: f64) -> (f64, f64) {
        let iqr = self.iqr();
        (self.q1 - multiplier * iqr, self.q3 + multiplier * iqr)
    }

    /// Check if a value is an outlier using the IQR method.
    pub fn is_outlier_iqr(&self, value: f64, multiplier: f64) -> bool {
        let (lower, upper) = self.iqr_bounds(multiplier);
        value < lower || value > upper
    }

    /// Calculate the z-score for a value.
    pub fn z_score(&self, value: f64) -> f64 {
        stats::z_score(value, self.mean, self.std_dev)
    }
}

/// Profile of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    /// Inferred data type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub missing_count: usize,
    /// Share of rows with a missing value, 0–100.
    pub missing_percentage: f64,
    /// Distinct non-missing values.
    pub unique_count: usize,
    /// Non-missing values minus distinct ones.
    pub duplicate_count: usize,
    /// Present when at least one value coerces to a finite number.
    #[serde(flatten)]
    pub numeric: Option<NumericStatistics>,
}

/// Profile of a whole dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetProfile {
    pub row_count: usize,
    pub columns: IndexMap<String, ColumnProfile>,
}

impl DatasetProfile {
    /// Get a column profile by name.
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.get(name)
    }

    /// Columns whose inferred type is numeric.
    pub fn numeric_columns(&self) -> impl Iterator<Item = (&str, &ColumnProfile)> {
        self.columns
            .iter()
            .filter(|(_, p)| p.column_type.is_numeric())
            .map(|(name, p)| (name.as_str(), p))
    }
}
