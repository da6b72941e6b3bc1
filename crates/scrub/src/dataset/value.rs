//! Scalar cell values and their fail-closed coercions.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::formats;

/// A single cell of a dataset.
///
/// Decoded tables hold only `Text` and `Null`; stages introduce `Number`
/// (validation, imputation, capping) and `Bool` (outlier flags).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Create a text value.
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    /// Returns true for an absent value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for null or the empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Check if a value represents a missing entry.
    ///
    /// Null, the empty string, and the literals `null`, `na` and `n/a`
    /// (any case) are missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => {
                s.is_empty()
                    || s.eq_ignore_ascii_case("null")
                    || s.eq_ignore_ascii_case("na")
                    || s.eq_ignore_ascii_case("n/a")
            }
            _ => false,
        }
    }

    /// Coerce to a finite number, if the value is losslessly numeric.
    pub fn to_number(&self) -> Option<f64> {
        let number = match self {
            Value::Number(n) => *n,
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok()?
            }
            Value::Null | Value::Bool(_) => return None,
        };
        number.is_finite().then_some(number)
    }

    /// Coerce to a calendar date/time.
    pub fn to_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Text(s) => formats::parse_date(s),
            _ => None,
        }
    }

    /// Coerce to a boolean using `true/false`, `yes/no` and `1/0`.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Number(n) if *n == 1.0 => Some(true),
            Value::Number(n) if *n == 0.0 => Some(false),
            Value::Text(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_missing() {
        assert!(Value::Null.is_missing());
        assert!(Value::text("").is_missing());
        assert!(Value::text("NA").is_missing());
        assert!(Value::text("n/a").is_missing());
        assert!(Value::text("NULL").is_missing());
        assert!(!Value::text("0").is_missing());
        assert!(!Value::text("none").is_missing());
        assert!(!Value::Number(0.0).is_missing());
        assert!(!Value::Bool(false).is_missing());
    }

    #[test]
    fn test_to_number() {
        assert_eq!(Value::text("30").to_number(), Some(30.0));
        assert_eq!(Value::text(" 2.5 ").to_number(), Some(2.5));
        assert_eq!(Value::text("1e3").to_number(), Some(1000.0));
        assert_eq!(Value::text("").to_number(), None);
        assert_eq!(Value::text("abc").to_number(), None);
        assert_eq!(Value::text("inf").to_number(), None);
        assert_eq!(Value::text("NaN").to_number(), None);
        assert_eq!(Value::Bool(true).to_number(), None);
        assert_eq!(Value::Number(f64::INFINITY).to_number(), None);
    }

    #[test]
    fn test_to_bool() {
        assert_eq!(Value::text("Yes").to_bool(), Some(true));
        assert_eq!(Value::text("0").to_bool(), Some(false));
        assert_eq!(Value::Number(1.0).to_bool(), Some(true));
        assert_eq!(Value::text("maybe").to_bool(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(30.0).to_string(), "30");
        assert_eq!(Value::Number(32.5).to_string(), "32.5");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn test_json_shape() {
        let values: Vec<Value> = serde_json::from_str(r#"[null, true, 1.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Bool(true),
                Value::Number(1.5),
                Value::text("x")
            ]
        );
    }
}
