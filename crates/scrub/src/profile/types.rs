//! Inferred column types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Inferred data type for a column.
///
/// Inference checks the variants in declaration order and the first rule
/// matched by every sampled value wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Finite numbers.
    Numeric,
    /// Calendar dates or timestamps.
    Date,
    /// true/false, yes/no, 1/0.
    Boolean,
    /// Email addresses.
    Email,
    /// Anything else, including empty columns.
    #[default]
    String,
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Numeric)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Date => "date",
            ColumnType::Boolean => "boolean",
            ColumnType::Email => "email",
            ColumnType::String => "string",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
