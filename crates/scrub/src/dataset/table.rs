//! Rows and datasets.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrubError};

use super::value::Value;

static NULL: Value = Value::Null;

/// An open record mapping column name to value.
///
/// Column order follows insertion and is only used when encoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    cells: IndexMap<String, Value>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cell, if the column exists.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.get(column)
    }

    /// Get a cell, treating an absent column as null.
    pub fn value(&self, column: &str) -> &Value {
        self.cells.get(column).unwrap_or(&NULL)
    }

    /// Insert or replace a cell.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.cells.insert(column.into(), value.into());
    }

    /// Remove a column, preserving the order of the others.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.cells.shift_remove(column)
    }

    /// Check whether the row exposes a column.
    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(|k| k.as_str())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate mutably over `(column, value)` pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.cells.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    fn same_columns(&self, other: &Row) -> bool {
        self.len() == other.len() && other.columns().all(|c| self.contains(c))
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// An ordered sequence of rows.
///
/// Stages filter rows but never reorder them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    /// Create a dataset from rows.
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names, taken from the first row.
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|r| r.columns().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Number of columns, taken from the first row.
    pub fn column_count(&self) -> usize {
        self.rows.first().map(Row::len).unwrap_or(0)
    }

    /// All values of a column in row order (absent cells read as null).
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> {
        self.rows.iter().map(move |row| row.value(column))
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Keep only rows matching the predicate, preserving order.
    pub fn retain(&mut self, keep: impl FnMut(&Row) -> bool) {
        self.rows.retain(keep);
    }

    /// Remove columns from every row.
    pub fn drop_columns(&mut self, columns: &[String]) {
        for row in &mut self.rows {
            for column in columns {
                row.remove(column);
            }
        }
    }

    /// Verify every row exposes the same column set as the first.
    pub fn check_consistent(&self) -> Result<()> {
        let Some(first) = self.rows.first() else {
            return Ok(());
        };
        for (idx, row) in self.rows.iter().enumerate().skip(1) {
            if !first.same_columns(row) {
                return Err(ScrubError::InconsistentColumns {
                    row: idx,
                    expected: first.columns().map(String::from).collect(),
                    found: row.columns().map(String::from).collect(),
                });
            }
        }
        Ok(())
    }
}

impl FromIterator<Row> for Dataset {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Dataset {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
