//! Declarative pipeline configuration.
//!
//! Configuration is read from JSON with camelCase keys. Every option has a
//! default, so `{}` is a complete document:
//!
//! ```
//! use scrub::PipelineConfig;
//!
//! let config = PipelineConfig::from_json_str(r#"{"outliers": {"strategy": "cap"}}"#).unwrap();
//! assert_eq!(config.missing_data.drop_column_threshold, 50.0);
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use chrono::format::{Item, StrftimeItems};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dataset::Value;
use crate::error::{Result, ScrubError};

/// Environment variable overriding `missingData.dropColumnThreshold`.
pub const ENV_DROP_COLUMN_THRESHOLD: &str = "SCRUB_DROP_COLUMN_THRESHOLD";
/// Environment variable overriding `duplicates.similarityThreshold`.
pub const ENV_SIMILARITY_THRESHOLD: &str = "SCRUB_SIMILARITY_THRESHOLD";
/// Environment variable overriding `outliers.threshold`.
pub const ENV_OUTLIER_THRESHOLD: &str = "SCRUB_OUTLIER_THRESHOLD";

/// Target layout name for ISO-8601 timestamps.
pub const ISO8601: &str = "ISO8601";

/// Complete configuration for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub missing_data: MissingDataConfig,
    pub duplicates: DuplicatesConfig,
    pub outliers: OutliersConfig,
    pub validation: ValidationConfig,
    pub standardization: StandardizationConfig,
}

/// How missing cells are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingStrategy {
    #[default]
    Impute,
    /// Accepted but not applied; gaps are imputed.
    Remove,
    /// Accepted but not applied; gaps are imputed.
    Flag,
}

/// Statistic used to impute numeric columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericMethod {
    Mean,
    #[default]
    Median,
}

/// Fill used for non-numeric columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoricalMethod {
    /// Most frequent value.
    #[default]
    Mode,
    /// The literal `"Unknown"`.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MissingDataConfig {
    pub strategy: MissingStrategy,
    pub numeric_method: NumericMethod,
    pub categorical_method: CategoricalMethod,
    /// Columns with a strictly greater missing percentage are dropped.
    pub drop_column_threshold: f64,
}

impl Default for MissingDataConfig {
    fn default() -> Self {
        Self {
            strategy: MissingStrategy::default(),
            numeric_method: NumericMethod::default(),
            categorical_method: CategoricalMethod::default(),
            drop_column_threshold: 50.0,
        }
    }
}

/// How duplicate rows are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateStrategy {
    #[default]
    Remove,
    /// Accepted but not applied; duplicates are left in place.
    Flag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DuplicatesConfig {
    pub strategy: DuplicateStrategy,
    /// Columns forming the duplicate key; empty means all columns.
    pub key_columns: Vec<String>,
    pub fuzzy_match: bool,
    pub similarity_threshold: f64,
}

impl Default for DuplicatesConfig {
    fn default() -> Self {
        Self {
            strategy: DuplicateStrategy::default(),
            key_columns: Vec::new(),
            fuzzy_match: false,
            similarity_threshold: 0.85,
        }
    }
}

/// Treatment applied to detected outliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierStrategy {
    Remove,
    Cap,
    #[default]
    Flag,
}

/// Outlier detection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    #[default]
    Iqr,
    Zscore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutliersConfig {
    pub strategy: OutlierStrategy,
    pub method: OutlierMethod,
    /// IQR multiplier `k`.
    pub threshold: f64,
}

impl Default for OutliersConfig {
    fn default() -> Self {
        Self {
            strategy: OutlierStrategy::default(),
            method: OutlierMethod::default(),
            threshold: 1.5,
        }
    }
}

/// A rule applied to one column by the validation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationRule {
    /// A standard validator: `email`, `url` or `numeric`.
    Named(String),
    /// AND-combined structured checks.
    Constraints(RuleConstraints),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Regular expression searched in the stringified value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Rules in document order.
    pub rules: IndexMap<String, ValidationRule>,
}

/// Case folding applied by standardization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextCase {
    #[default]
    Lowercase,
    Uppercase,
    Unset,
}

/// Target layout for reformatted dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateFormat {
    /// `2024-01-15T00:00:00.000Z`.
    Iso8601,
    /// A chrono `strftime` layout.
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StandardizationConfig {
    /// `"ISO8601"`, a strftime layout, or null to leave dates alone.
    pub dates: Option<String>,
    pub text: TextCase,
    pub trim_whitespace: bool,
    pub remove_special_chars: bool,
}

impl Default for StandardizationConfig {
    fn default() -> Self {
        Self {
            dates: Some(ISO8601.to_string()),
            text: TextCase::default(),
            trim_whitespace: true,
            remove_special_chars: false,
        }
    }
}

impl StandardizationConfig {
    /// The configured date layout, if date reformatting is enabled.
    pub fn date_format(&self) -> Option<DateFormat> {
        match self.dates.as_deref() {
            None | Some("") => None,
            Some(ISO8601) => Some(DateFormat::Iso8601),
            Some(custom) => Some(DateFormat::Custom(custom.to_string())),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file without validating it.
    ///
    /// Pair with [`PipelineConfig::with_env_overrides`], which validates
    /// after the overrides are applied.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ScrubError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Apply threshold overrides from the environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply threshold overrides from a lookup function.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = parse_override(&lookup, ENV_DROP_COLUMN_THRESHOLD)? {
            self.missing_data.drop_column_threshold = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_SIMILARITY_THRESHOLD)? {
            self.duplicates.similarity_threshold = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_OUTLIER_THRESHOLD)? {
            self.outliers.threshold = v;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check every option against its allowed range.
    pub fn validate(&self) -> Result<()> {
        check_range(
            "missingData.dropColumnThreshold",
            self.missing_data.drop_column_threshold,
            0.0,
            100.0,
        )?;
        check_range(
            "duplicates.similarityThreshold",
            self.duplicates.similarity_threshold,
            0.0,
            1.0,
        )?;
        check_range("outliers.threshold", self.outliers.threshold, 0.0, f64::MAX)?;

        if let Some(DateFormat::Custom(layout)) = self.standardization.date_format() {
            check_date_layout(&layout)?;
        }

        for (column, rule) in &self.validation.rules {
            if let ValidationRule::Constraints(constraints) = rule {
                constraints.validate(column)?;
            }
        }

        Ok(())
    }
}

impl RuleConstraints {
    /// Check bounds and compile the pattern, if any.
    pub fn validate(&self, column: &str) -> Result<Option<Regex>> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(ScrubError::Config(format!(
                    "validation.rules.{}: min {} is greater than max {}",
                    column, min, max
                )));
            }
        }
        self.pattern
            .as_deref()
            .map(|p| {
                Regex::new(p).map_err(|source| ScrubError::Regex {
                    column: column.to_string(),
                    source,
                })
            })
            .transpose()
    }
}

/// A layout must parse and must render a date without a time zone.
/// Offset specifiers such as `%z` fail on naive timestamps.
fn check_date_layout(layout: &str) -> Result<()> {
    let invalid = || {
        ScrubError::Config(format!(
            "standardization.dates: invalid date format '{}'",
            layout
        ))
    };
    if StrftimeItems::new(layout).any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }
    let mut sample = String::new();
    write!(sample, "{}", NaiveDateTime::default().format(layout)).map_err(|_| invalid())
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ScrubError::Config(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )))
    }
}

fn parse_override(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<f64>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ScrubError::Config(format!("{} is not a number: '{}'", key, raw))),
    }
}
