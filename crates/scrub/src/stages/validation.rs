//! Per-column rule enforcement.

use regex::Regex;
use tracing::debug;

use crate::config::{PipelineConfig, RuleConstraints, ValidationRule};
use crate::dataset::{Dataset, Value};
use crate::error::Result;
use crate::formats;

use super::{Metric, Stage, StageChanges, StageResult};

/// A validation rule ready to evaluate.
#[derive(Debug)]
enum CompiledRule {
    Email,
    Url,
    /// Valid cells are converted to numbers.
    Numeric,
    /// Unrecognized validator name; accepts everything.
    Ignored,
    Constraints {
        min: Option<f64>,
        max: Option<f64>,
        pattern: Option<Regex>,
        allowed: Option<Vec<String>>,
    },
}

impl CompiledRule {
    fn compile(column: &str, rule: &ValidationRule) -> Result<Self> {
        Ok(match rule {
            ValidationRule::Named(name) => match name.to_lowercase().as_str() {
                "email" => CompiledRule::Email,
                "url" => CompiledRule::Url,
                "numeric" => CompiledRule::Numeric,
                _ => {
                    debug!(column, validator = %name, "Unrecognized validator ignored");
                    CompiledRule::Ignored
                }
            },
            ValidationRule::Constraints(constraints) => Self::compile_constraints(column, constraints)?,
        })
    }

    fn compile_constraints(column: &str, constraints: &RuleConstraints) -> Result<Self> {
        let pattern = constraints.validate(column)?;
        Ok(CompiledRule::Constraints {
            min: constraints.min,
            max: constraints.max,
            pattern,
            allowed: constraints
                .allowed
                .as_ref()
                .map(|values| values.iter().map(Value::to_string).collect()),
        })
    }

    /// Check a non-blank cell. `Ok(Some(v))` replaces the cell with `v`.
    fn check(&self, value: &Value) -> std::result::Result<Option<Value>, ()> {
        match self {
            CompiledRule::Email => accept_if(formats::is_email(&value.to_string())),
            CompiledRule::Url => accept_if(formats::is_url(&value.to_string())),
            CompiledRule::Numeric => value.to_number().map(|n| Some(Value::Number(n))).ok_or(()),
            CompiledRule::Ignored => Ok(None),
            CompiledRule::Constraints {
                min,
                max,
                pattern,
                allowed,
            } => {
                if min.is_some() || max.is_some() {
                    let number = value.to_number().ok_or(())?;
                    if min.is_some_and(|m| number < m) || max.is_some_and(|m| number > m) {
                        return Err(());
                    }
                }
                let text = value.to_string();
                if let Some(re) = pattern {
                    if !re.is_match(&text) {
                        return Err(());
                    }
                }
                if let Some(allowed) = allowed {
                    if !allowed.contains(&text) {
                        return Err(());
                    }
                }
                Ok(None)
            }
        }
    }
}

fn accept_if(valid: bool) -> std::result::Result<Option<Value>, ()> {
    if valid { Ok(None) } else { Err(()) }
}

/// Enforces the configured column rules.
///
/// Rules run in configuration order. A failing cell is nulled and its row
/// is dropped before the next rule runs; blank cells are exempt.
pub struct ValidationStage;

impl ValidationStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ValidationStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for ValidationStage {
    fn name(&self) -> &'static str {
        "Data Validation & Type Conversion"
    }

    fn apply(&self, mut data: Dataset, config: &PipelineConfig) -> Result<StageResult> {
        let mut changes =
            StageChanges::with_metrics(&[Metric::ValuesCorrected, Metric::RowsRemoved]);

        for (column, rule) in &config.validation.rules {
            let compiled = CompiledRule::compile(column, rule)?;
            if matches!(compiled, CompiledRule::Ignored) {
                continue;
            }

            let mut invalid = vec![false; data.len()];
            for (idx, row) in data.rows_mut().iter_mut().enumerate() {
                let value = row.value(column);
                if value.is_blank() {
                    continue;
                }
                match compiled.check(value) {
                    Ok(Some(replacement)) => row.set(column.as_str(), replacement),
                    Ok(None) => {}
                    Err(()) => {
                        row.set(column.as_str(), Value::Null);
                        invalid[idx] = true;
                        changes.increment(Metric::ValuesCorrected);
                    }
                }
            }

            let before = data.len();
            let mut flags = invalid.into_iter();
            data.retain(|_| !flags.next().unwrap_or(false));
            let removed = before - data.len();
            changes.add(Metric::RowsRemoved, removed);

            debug!(column = %column, removed, "Validation rule applied");
        }

        Ok(StageResult::new(data, changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Row;
    use crate::error::ScrubError;

    fn dataset(column: &str, values: &[&str]) -> Dataset {
        values
            .iter()
            .map(|v| [(column, *v), ("id", "x")].into_iter().collect::<Row>())
            .collect()
    }

    fn config_with(rules: &str) -> PipelineConfig {
        PipelineConfig::from_json_str(&format!(r#"{{"validation": {{"rules": {}}}}}"#, rules))
            .unwrap()
    }

    fn column(data: &Dataset, name: &str) -> Vec<Value> {
        data.column_values(name).cloned().collect()
    }

    #[test]
    fn test_email_rule_drops_invalid_rows() {
        let data = dataset("email", &["a@example.com", "bogus", "", "b@example.org"]);
        let result = ValidationStage::new()
            .apply(data, &config_with(r#"{"email": "email"}"#))
            .unwrap();

        assert_eq!(result.data.len(), 3);
        assert_eq!(result.changes.get(Metric::RowsRemoved), 1);
        assert_eq!(result.changes.get(Metric::ValuesCorrected), 1);
        // Blank cells pass through unchanged.
        assert_eq!(result.data.rows()[1].value("email"), &Value::text(""));
    }

    #[test]
    fn test_numeric_rule_coerces() {
        let data = dataset("age", &["30", "abc", "41.5"]);
        let result = ValidationStage::new()
            .apply(data, &config_with(r#"{"age": "NUMERIC"}"#))
            .unwrap();

        assert_eq!(
            column(&result.data, "age"),
            vec![Value::Number(30.0), Value::Number(41.5)]
        );
    }

    #[test]
    fn test_url_rule() {
        let data = dataset("site", &["https://example.com", "not a url"]);
        let result = ValidationStage::new()
            .apply(data, &config_with(r#"{"site": "url"}"#))
            .unwrap();
        assert_eq!(result.data.len(), 1);
    }

    #[test]
    fn test_unknown_validator_is_noop() {
        let data = dataset("x", &["anything"]);
        let result = ValidationStage::new()
            .apply(data, &config_with(r#"{"x": "phone"}"#))
            .unwrap();
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.changes.get(Metric::ValuesCorrected), 0);
    }

    #[test]
    fn test_range_rule() {
        let data = dataset("age", &["5", "150", "-1", "abc", "42"]);
        let result = ValidationStage::new()
            .apply(data, &config_with(r#"{"age": {"min": 0, "max": 120}}"#))
            .unwrap();

        assert_eq!(column(&result.data, "age"), vec![Value::text("5"), Value::text("42")]);
        assert_eq!(result.changes.get(Metric::RowsRemoved), 3);
    }

    #[test]
    fn test_pattern_and_allowed_combine() {
        let data = dataset("code", &["ABC", "abc", "XYZ", "QRS"]);
        let result = ValidationStage::new()
            .apply(
                data,
                &config_with(r#"{"code": {"pattern": "^[A-Z]{3}$", "allowed": ["ABC", "XYZ"]}}"#),
            )
            .unwrap();
        assert_eq!(column(&result.data, "code"), vec![Value::text("ABC"), Value::text("XYZ")]);
    }

    #[test]
    fn test_allowed_compares_stringified() {
        let data = dataset("level", &["1", "2", "3"]);
        let result = ValidationStage::new()
            .apply(data, &config_with(r#"{"level": {"allowed": [1, 2]}}"#))
            .unwrap();
        assert_eq!(result.data.len(), 2);
    }

    #[test]
    fn test_rules_apply_in_order_across_columns() {
        let data: Dataset = vec![
            [("a", "1"), ("b", "x@example.com")].into_iter().collect::<Row>(),
            [("a", "oops"), ("b", "bad")].into_iter().collect::<Row>(),
            [("a", "3"), ("b", "bad")].into_iter().collect::<Row>(),
        ]
        .into_iter()
        .collect();
        let result = ValidationStage::new()
            .apply(data, &config_with(r#"{"a": "numeric", "b": "email"}"#))
            .unwrap();

        // Row 2 is dropped by the first rule, so the second rule only nulls row 3.
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.changes.get(Metric::RowsRemoved), 2);
        assert_eq!(result.changes.get(Metric::ValuesCorrected), 2);
    }

    #[test]
    fn test_bad_pattern_is_error() {
        let mut config = PipelineConfig::default();
        config.validation.rules.insert(
            "x".to_string(),
            ValidationRule::Constraints(RuleConstraints {
                pattern: Some("([".to_string()),
                ..Default::default()
            }),
        );
        let err = ValidationStage::new()
            .apply(dataset("x", &["a"]), &config)
            .unwrap_err();
        assert!(matches!(err, ScrubError::Regex { .. }));
    }
}
