//! File-level integration tests: codec, artifact store and jobs.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use scrub::job::{FileStatus, read_record};
use scrub::{
    ArtifactStore, CleansingService, ErrorKind, JobProcessor, JobStatus, JobStore, OutputFormat,
    Parser, PipelineConfig, RetryPolicy, Value, WorkQueue, Writer,
};

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

fn processor(root: &Path, format: OutputFormat) -> JobProcessor {
    let store = ArtifactStore::open(root.join("out")).unwrap();
    let jobs = JobStore::open(root.join("out/jobs")).unwrap();
    let queue = WorkQueue::new(2).with_retry(RetryPolicy {
        attempts: 2,
        base_delay: Duration::from_millis(1),
        jitter: 0.0,
    });
    JobProcessor::new(jobs, CleansingService::new(store).with_format(format), queue)
}

// =============================================================================
// Codec
// =============================================================================

#[test]
fn test_parse_clean_encode_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        dir.path(),
        "people.tsv",
        "name\tcity\n Ada \tLondon\nGrace\tNew York\n",
    );

    let (data, source) = Parser::new().parse_file(&input).unwrap();
    assert_eq!(source.format, "tsv");
    assert_eq!(source.row_count, 2);
    assert!(source.hash.starts_with("sha256:"));

    let (cleaned, _) = scrub::run(data, &PipelineConfig::default()).unwrap();
    let output = dir.path().join("people.cleaned.tsv");
    Writer::new(OutputFormat::Tsv)
        .write_file(&cleaned, &output)
        .unwrap();

    let (reparsed, _) = Parser::new().parse_file(&output).unwrap();
    assert_eq!(reparsed, cleaned);
    assert_eq!(reparsed.rows()[0].value("name"), &Value::text("ada"));
}

#[test]
fn test_header_only_file_is_empty_dataset() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "empty.csv", "a,b\n");

    let (data, source) = Parser::new().parse_file(&input).unwrap();
    assert!(data.is_empty());
    assert_eq!(source.row_count, 0);
}

#[test]
fn test_encoding_empty_result_fails() {
    let err = Writer::new(OutputFormat::Csv)
        .encode(&scrub::Dataset::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyDatasetResult);
}

// =============================================================================
// Service
// =============================================================================

#[test]
fn test_service_stores_artifacts() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "scores.csv", "id,score\n1,10\n2,\n3,30\n3,30\n");
    let service = CleansingService::new(ArtifactStore::open(dir.path().join("out")).unwrap())
        .with_format(OutputFormat::Json);

    let result = service
        .process_file(&input, &PipelineConfig::default(), "job_single")
        .unwrap();

    assert_eq!(result.report.final_summary.row_count, 3);
    assert!(result.processed.file_name.ends_with("_scores.json"));
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&result.processed.path).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 3);
    assert_eq!(json[1]["score"], 30.0);

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&result.report_path).unwrap()).unwrap();
    assert_eq!(report["original"]["rowCount"], 4);
    assert_eq!(report["final"]["duplicatesRemoved"], 1);
    assert_eq!(report["steps"].as_array().unwrap().len(), 5);
}

// =============================================================================
// Jobs
// =============================================================================

#[tokio::test]
async fn test_job_over_several_files() {
    let dir = TempDir::new().unwrap();
    let files = vec![
        write_file(dir.path(), "a.csv", "x,y\n1,foo\n2,bar\n"),
        write_file(dir.path(), "b.csv", "x\n5\n5\n6\n"),
        write_file(dir.path(), "c.csv", "name\nAda\n"),
    ];

    let processor = processor(dir.path(), OutputFormat::Csv);
    let record = processor
        .submit_with_id("job_many".to_string(), files, PipelineConfig::default())
        .await
        .unwrap();

    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.progress, 100);
    assert_eq!(record.files_processed, 3);
    assert!(record.completed_at.is_some());
    assert!(record.files.iter().all(|f| f.status == FileStatus::Completed));

    let b = record.report.files.iter().find(|r| r.filename == "b.csv").unwrap();
    assert_eq!(b.corrections.duplicates_removed, 1);
    assert_eq!(b.cleaned.row_count, 2);

    for n in 1..=3 {
        let report = dir.path().join(format!("out/reports/job_many_{}_report.json", n));
        assert!(report.exists(), "missing {}", report.display());
    }

    let persisted = read_record(processor.jobs().path_for("job_many")).unwrap();
    assert_eq!(persisted.status, record.status);
    assert_eq!(persisted.files, record.files);
    assert_eq!(persisted.report.files.len(), 3);
    assert_eq!(persisted.completed_at, record.completed_at);
}

#[tokio::test]
async fn test_single_file_job_uses_job_id_for_report() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "a.csv", "x\n1\n");

    processor(dir.path(), OutputFormat::Csv)
        .submit_with_id("job_one".to_string(), vec![file], PipelineConfig::default())
        .await
        .unwrap();

    assert!(dir.path().join("out/reports/job_one_report.json").exists());
}

#[tokio::test]
async fn test_malformed_file_fails_job_but_not_siblings() {
    let dir = TempDir::new().unwrap();
    let good = write_file(dir.path(), "good.csv", "x\n1\n2\n");
    let bad = write_file(dir.path(), "bad.csv", "x,x\n1,2\n");

    let processor = processor(dir.path(), OutputFormat::Csv);
    let record = processor
        .submit_with_id(
            "job_mixed".to_string(),
            vec![good.clone(), bad.clone()],
            PipelineConfig::default(),
        )
        .await
        .unwrap();

    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(record.files_processed, 1);
    assert_eq!(record.progress, 50);
    let good_file = record.files.iter().find(|f| f.path == good).unwrap();
    assert_eq!(good_file.status, FileStatus::Completed);
    let bad_file = record.files.iter().find(|f| f.path == bad).unwrap();
    assert_eq!(bad_file.status, FileStatus::Failed);
    assert!(bad_file.error.as_deref().unwrap().contains("Malformed input"));
}

#[tokio::test]
async fn test_jobs_are_listed() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "a.csv", "x\n1\n");
    let processor = processor(dir.path(), OutputFormat::Csv);

    for id in ["job_first", "job_second"] {
        processor
            .submit_with_id(id.to_string(), vec![file.clone()], PipelineConfig::default())
            .await
            .unwrap();
    }

    let ids: Vec<String> = processor
        .jobs()
        .list()
        .unwrap()
        .into_iter()
        .map(|r| r.job_id)
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"job_first".to_string()));
    assert!(processor.jobs().load("job_missing").is_err());
}
