//! Exact and fuzzy duplicate-row removal.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::config::{DuplicateStrategy, PipelineConfig};
use crate::dataset::{Dataset, Row};
use crate::error::Result;

use super::{Metric, Stage, StageChanges, StageResult};

/// Removes rows whose key columns repeat an earlier row.
///
/// Exact mode compares joined key strings. Fuzzy mode compares every
/// surviving anchor against all later rows, so it is quadratic in the
/// row count.
pub struct DuplicatesStage;

impl DuplicatesStage {
    pub fn new() -> Self {
        Self
    }

    fn remove_exact(&self, data: &mut Dataset, columns: &[String], changes: &mut StageChanges) {
        let mut seen = HashSet::new();
        data.retain(|row| {
            let fresh = seen.insert(composite_key(row, columns, "|"));
            if !fresh {
                changes.increment(Metric::DuplicatesFound);
                changes.increment(Metric::RowsRemoved);
            }
            fresh
        });
    }

    fn remove_fuzzy(
        &self,
        data: &mut Dataset,
        columns: &[String],
        threshold: f64,
        changes: &mut StageChanges,
    ) {
        let keys: Vec<String> = data
            .iter()
            .map(|row| composite_key(row, columns, " "))
            .collect();
        let mut duplicate = vec![false; keys.len()];

        for anchor in 0..keys.len() {
            if duplicate[anchor] {
                continue;
            }
            for other in anchor + 1..keys.len() {
                if !duplicate[other] && similarity(&keys[anchor], &keys[other]) >= threshold {
                    duplicate[other] = true;
                    changes.increment(Metric::DuplicatesFound);
                    changes.increment(Metric::RowsRemoved);
                }
            }
        }

        let mut flags = duplicate.into_iter();
        data.retain(|_| !flags.next().unwrap_or(false));
    }
}

impl Default for DuplicatesStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for DuplicatesStage {
    fn name(&self) -> &'static str {
        "Duplicate Detection & Removal"
    }

    fn apply(&self, mut data: Dataset, config: &PipelineConfig) -> Result<StageResult> {
        let mut changes =
            StageChanges::with_metrics(&[Metric::RowsRemoved, Metric::DuplicatesFound]);
        let settings = &config.duplicates;

        if data.is_empty() {
            return Ok(StageResult::new(data, changes));
        }
        if settings.strategy != DuplicateStrategy::Remove {
            warn!(strategy = ?settings.strategy, "Duplicate strategy not applied; rows left in place");
            return Ok(StageResult::new(data, changes));
        }

        let columns = if settings.key_columns.is_empty() {
            data.columns()
        } else {
            settings.key_columns.clone()
        };

        if settings.fuzzy_match {
            self.remove_fuzzy(&mut data, &columns, settings.similarity_threshold, &mut changes);
        } else {
            self.remove_exact(&mut data, &columns, &mut changes);
        }

        debug!(
            removed = changes.get(Metric::RowsRemoved),
            fuzzy = settings.fuzzy_match,
            "Duplicate removal finished"
        );
        Ok(StageResult::new(data, changes))
    }
}

fn composite_key(row: &Row, columns: &[String], separator: &str) -> String {
    columns
        .iter()
        .map(|c| row.value(c).to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Sørensen–Dice coefficient over character bigrams, in `[0, 1]`.
///
/// Whitespace is ignored and comparison is case-insensitive. Identical
/// strings score 1; strings shorter than two characters otherwise score 0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_lowercase).collect();
    let b: Vec<char> = b.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_lowercase).collect();

    if a == b {
        return 1.0;
    }
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut bigrams: HashMap<(char, char), usize> = HashMap::new();
    for pair in a.windows(2) {
        *bigrams.entry((pair[0], pair[1])).or_insert(0) += 1;
    }

    let mut intersection = 0;
    for pair in b.windows(2) {
        if let Some(count) = bigrams.get_mut(&(pair[0], pair[1])) {
            if *count > 0 {
                *count -= 1;
                intersection += 1;
            }
        }
    }

    2.0 * intersection as f64 / (a.len() + b.len() - 2) as f64
}
