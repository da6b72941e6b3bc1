//! Per-stage change counters.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A counter a stage can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    RowsRemoved,
    ColumnsRemoved,
    ValuesCorrected,
    DuplicatesFound,
    OutliersFound,
    OutliersRemoved,
    OutliersCapped,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::RowsRemoved => "rowsRemoved",
            Metric::ColumnsRemoved => "columnsRemoved",
            Metric::ValuesCorrected => "valuesCorrected",
            Metric::DuplicatesFound => "duplicatesFound",
            Metric::OutliersFound => "outliersFound",
            Metric::OutliersRemoved => "outliersRemoved",
            Metric::OutliersCapped => "outliersCapped",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from metric to count. Metrics a stage never declared read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageChanges {
    counts: IndexMap<Metric, usize>,
}

impl StageChanges {
    /// Start with the given metrics reported as zero.
    pub fn with_metrics(metrics: &[Metric]) -> Self {
        Self {
            counts: metrics.iter().map(|m| (*m, 0)).collect(),
        }
    }

    /// Read a counter.
    pub fn get(&self, metric: Metric) -> usize {
        self.counts.get(&metric).copied().unwrap_or(0)
    }

    /// Add to a counter.
    pub fn add(&mut self, metric: Metric, amount: usize) {
        *self.counts.entry(metric).or_insert(0) += amount;
    }

    /// Increment a counter by one.
    pub fn increment(&mut self, metric: Metric) {
        self.add(metric, 1);
    }

    /// Iterate over reported counters in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, usize)> + '_ {
        self.counts.iter().map(|(m, c)| (*m, *c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_metric_is_zero() {
        let changes = StageChanges::with_metrics(&[Metric::ValuesCorrected]);
        assert_eq!(changes.get(Metric::OutliersFound), 0);
    }

    #[test]
    fn test_serializes_declared_metrics() {
        let mut changes = StageChanges::with_metrics(&[Metric::RowsRemoved, Metric::DuplicatesFound]);
        changes.increment(Metric::DuplicatesFound);
        let json = serde_json::to_string(&changes).unwrap();
        assert_eq!(json, r#"{"rowsRemoved":0,"duplicatesFound":1}"#);
    }
}
