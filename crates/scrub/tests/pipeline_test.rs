//! End-to-end pipeline scenarios.

use scrub::config::{OutlierStrategy, ValidationRule};
use scrub::{Dataset, ErrorKind, Metric, PipelineConfig, Row, Value};

/// Build a dataset from rows of `(column, text)` pairs.
fn dataset(rows: &[&[(&str, &str)]]) -> Dataset {
    rows.iter()
        .map(|cells| cells.iter().copied().collect::<Row>())
        .collect()
}

fn column(data: &Dataset, name: &str) -> Vec<Value> {
    data.column_values(name).cloned().collect()
}

// =============================================================================
// Missing Data
// =============================================================================

#[test]
fn test_median_imputation_scenario() {
    let data = dataset(&[&[("age", "30")], &[("age", "")], &[("age", "35")]]);

    let (cleaned, report) = scrub::run(data, &PipelineConfig::default()).unwrap();

    assert_eq!(cleaned.len(), 3);
    assert_eq!(cleaned.rows()[1].value("age"), &Value::Number(32.5));
    let ages: Vec<f64> = cleaned
        .column_values("age")
        .map(|v| v.to_number().unwrap())
        .collect();
    assert_eq!(ages, vec![30.0, 32.5, 35.0]);

    let missing = report
        .steps
        .iter()
        .find(|s| s.name == "Missing Data Handler")
        .unwrap();
    assert_eq!(missing.changes.get(Metric::ValuesCorrected), 1);
}

#[test]
fn test_column_at_threshold_is_kept() {
    let data = dataset(&[
        &[("id", "1"), ("half", "a"), ("sparse", "x")],
        &[("id", "2"), ("half", ""), ("sparse", "")],
        &[("id", "3"), ("half", "b"), ("sparse", "")],
        &[("id", "4"), ("half", ""), ("sparse", "")],
    ]);

    let (cleaned, report) = scrub::run(data, &PipelineConfig::default()).unwrap();

    assert_eq!(cleaned.columns(), vec!["id", "half"]);
    assert_eq!(report.final_summary.columns_removed, 1);
    assert!(cleaned.column_values("half").all(|v| !v.is_missing()));
}

#[test]
fn test_column_above_threshold_is_dropped() {
    let data = dataset(&[
        &[("id", "1"), ("half", "a")],
        &[("id", "2"), ("half", "")],
        &[("id", "3"), ("half", "b")],
        &[("id", "4"), ("half", "")],
    ]);
    let mut config = PipelineConfig::default();
    config.missing_data.drop_column_threshold = 49.0;

    let (cleaned, _) = scrub::run(data, &config).unwrap();
    assert_eq!(cleaned.columns(), vec!["id"]);
}

// =============================================================================
// Duplicates
// =============================================================================

#[test]
fn test_fuzzy_duplicate_scenario() {
    let data = dataset(&[&[("name", "Bob Smith")], &[("name", "bob smith")]]);
    let mut config = PipelineConfig::default();
    config.duplicates.fuzzy_match = true;
    config.duplicates.similarity_threshold = 0.9;

    let (cleaned, report) = scrub::run(data, &config).unwrap();

    assert_eq!(cleaned.len(), 1);
    assert_eq!(report.total(Metric::DuplicatesFound), 1);
    assert_eq!(report.final_summary.duplicates_removed, 1);
}

#[test]
fn test_exact_duplicates_remove_repeats() {
    let data = dataset(&[
        &[("id", "1"), ("city", "Paris")],
        &[("id", "2"), ("city", "Lyon")],
        &[("id", "1"), ("city", "Paris")],
        &[("id", "3"), ("city", "Nice")],
        &[("id", "2"), ("city", "Lyon")],
        &[("id", "4"), ("city", "Lille")],
    ]);

    let (cleaned, report) = scrub::run(data, &PipelineConfig::default()).unwrap();

    assert_eq!(cleaned.len(), 4);
    assert_eq!(report.total(Metric::DuplicatesFound), 2);
    assert_eq!(
        column(&cleaned, "city"),
        vec![
            Value::text("paris"),
            Value::text("lyon"),
            Value::text("nice"),
            Value::text("lille")
        ]
    );
}

#[test]
fn test_key_columns_limit_comparison() {
    let data = dataset(&[
        &[("id", "1"), ("note", "first")],
        &[("id", "1"), ("note", "second")],
        &[("id", "2"), ("note", "third")],
    ]);
    let mut config = PipelineConfig::default();
    config.duplicates.key_columns = vec!["id".to_string()];

    let (cleaned, _) = scrub::run(data, &config).unwrap();
    assert_eq!(column(&cleaned, "note"), vec![Value::text("first"), Value::text("third")]);
}

// =============================================================================
// Outliers
// =============================================================================

fn skewed() -> Dataset {
    dataset(&[
        &[("v", "1")],
        &[("v", "2")],
        &[("v", "3")],
        &[("v", "4")],
        &[("v", "5")],
        &[("v", "100")],
    ])
}

#[test]
fn test_iqr_cap_clamps_to_upper_bound() {
    let mut config = PipelineConfig::default();
    config.outliers.strategy = OutlierStrategy::Cap;

    let (cleaned, report) = scrub::run(skewed(), &config).unwrap();

    assert_eq!(cleaned.len(), 6);
    assert_eq!(cleaned.rows()[5].value("v"), &Value::Number(8.5));
    assert_eq!(report.total(Metric::OutliersFound), 1);
    assert_eq!(report.total(Metric::OutliersCapped), 1);
}

#[test]
fn test_iqr_remove_drops_outlier_row() {
    let mut config = PipelineConfig::default();
    config.outliers.strategy = OutlierStrategy::Remove;

    let (cleaned, report) = scrub::run(skewed(), &config).unwrap();

    assert_eq!(cleaned.len(), 5);
    assert_eq!(report.final_summary.rows_removed, 1);
    assert_eq!(report.final_summary.outliers_found, 1);
}

#[test]
fn test_remove_across_two_columns() {
    let data = dataset(&[
        &[("a", "1"), ("b", "10")],
        &[("a", "2"), ("b", "11")],
        &[("a", "3"), ("b", "12")],
        &[("a", "4"), ("b", "13")],
        &[("a", "5"), ("b", "14")],
        &[("a", "100"), ("b", "15")],
        &[("a", "3"), ("b", "500")],
        &[("a", "200"), ("b", "900")],
    ]);
    let mut config = PipelineConfig::default();
    config.outliers.strategy = OutlierStrategy::Remove;

    let (cleaned, report) = scrub::run(data, &config).unwrap();

    assert_eq!(cleaned.len(), 5);
    assert_eq!(report.total(Metric::OutliersFound), 3);
    assert_eq!(report.total(Metric::OutliersRemoved), 3);
    assert_eq!(report.final_summary.rows_removed, 3);
    assert_eq!(report.final_summary.outliers_found, 3);
}

#[test]
fn test_flag_adds_outlier_column() {
    let (cleaned, _) = scrub::run(skewed(), &PipelineConfig::default()).unwrap();

    assert_eq!(cleaned.columns(), vec!["v", "v_outlier"]);
    let flags: Vec<Value> = column(&cleaned, "v_outlier");
    assert_eq!(flags.iter().filter(|v| **v == Value::Bool(true)).count(), 1);
    assert_eq!(flags[5], Value::Bool(true));
}

// =============================================================================
// Validation and Standardization
// =============================================================================

#[test]
fn test_validation_drops_invalid_rows() {
    let data = dataset(&[
        &[("email", "ada@example.com"), ("score", "10")],
        &[("email", "not-an-email"), ("score", "20")],
        &[("email", "bob@example.org"), ("score", "abc")],
    ]);
    let config = PipelineConfig::from_json_str(
        r#"{"validation": {"rules": {"email": "email", "score": "numeric"}}}"#,
    )
    .unwrap();

    let (cleaned, report) = scrub::run(data, &config).unwrap();

    assert_eq!(cleaned.len(), 1);
    assert_eq!(cleaned.rows()[0].value("score"), &Value::Number(10.0));
    let validation = &report.steps[1];
    assert_eq!(validation.name, "Data Validation & Type Conversion");
    assert_eq!(validation.changes.get(Metric::RowsRemoved), 2);
}

#[test]
fn test_dates_reformatted_to_iso() {
    let data = dataset(&[&[("joined", " 2024-01-15 ")], &[("joined", "2023-12-01")]]);

    let (cleaned, _) = scrub::run(data, &PipelineConfig::default()).unwrap();

    assert_eq!(
        cleaned.rows()[0].value("joined"),
        &Value::text("2024-01-15T00:00:00.000Z")
    );
}

// =============================================================================
// Report and Errors
// =============================================================================

#[test]
fn test_report_lists_stages_in_order() {
    let (_, report) = scrub::run(skewed(), &PipelineConfig::default()).unwrap();

    let names: Vec<&str> = report.steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Data Standardization",
            "Data Validation & Type Conversion",
            "Missing Data Handler",
            "Duplicate Detection & Removal",
            "Outlier Detection & Treatment",
        ]
    );
    assert_eq!(report.original.row_count, 6);
    assert_eq!(report.final_summary.row_count, 6);
    assert_eq!(report.final_summary.column_count, 2);
}

#[test]
fn test_run_is_deterministic() {
    let data = dataset(&[
        &[("name", "Ada"), ("age", "36"), ("city", "")],
        &[("name", "ada "), ("age", ""), ("city", "London")],
        &[("name", "Grace"), ("age", "85"), ("city", "NYC")],
        &[("name", "Alan"), ("age", "41"), ("city", "london")],
    ]);
    let mut config = PipelineConfig::default();
    config.duplicates.fuzzy_match = true;

    let (first, a) = scrub::run(data.clone(), &config).unwrap();
    let (second, b) = scrub::run(data, &config).unwrap();

    assert_eq!(first, second);
    assert_eq!(a.original, b.original);
    assert_eq!(a.final_summary, b.final_summary);
    let changes = |r: &scrub::CleansingReport| {
        r.steps
            .iter()
            .map(|s| (s.name.clone(), s.changes.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(changes(&a), changes(&b));
}

#[test]
fn test_invalid_configuration_is_fatal() {
    let mut config = PipelineConfig::default();
    config.duplicates.similarity_threshold = 1.5;

    let err = scrub::run(skewed(), &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
}

#[test]
fn test_bad_pattern_is_fatal() {
    let mut config = PipelineConfig::default();
    config.validation.rules.insert(
        "v".to_string(),
        ValidationRule::Constraints(scrub::config::RuleConstraints {
            pattern: Some("([".to_string()),
            ..Default::default()
        }),
    );

    let err = scrub::run(skewed(), &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
}
