//! Integration tests for the analyzer and result store

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{TimeZone, Utc};

use pull_benchmark::analyze::{analyze, AnalyzeOptions, OutputFormat};
use pull_benchmark::error::BenchError;
use pull_benchmark::models::{Benchmark, BenchmarkResult, Measurement, Suite, SuiteBenchmark};
use pull_benchmark::store::{read_document, write_json, Document};

fn benchmark(image: &str, millis: &[u64]) -> Benchmark {
    let start = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    let mut benchmark = Benchmark::new(image);
    for ms in millis {
        benchmark
            .measurements
            .push(Measurement::new(start, Duration::from_millis(*ms)).unwrap());
    }
    benchmark
}

fn result(benchmarks: Vec<Benchmark>) -> BenchmarkResult {
    BenchmarkResult {
        metadata: None,
        benchmarks,
    }
}

fn options(output_dir: &Path, paths: Vec<PathBuf>, format: OutputFormat) -> AnalyzeOptions {
    AnalyzeOptions {
        output_dir: output_dir.to_path_buf(),
        paths,
        format,
        labels: vec![],
        timeline: false,
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    if !dir.exists() {
        return vec![];
    }
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_directories_are_paired_by_file_name() {
    let root = tempfile::tempdir().unwrap();
    let baseline = root.path().join("baseline");
    let spegel = root.path().join("spegel");
    let output = root.path().join("charts");

    write_json(
        &baseline.join("benchmark-1.json"),
        &result(vec![benchmark("example.com/app:v1", &[900, 1100])]),
    )
    .unwrap();
    write_json(
        &spegel.join("benchmark-1.json"),
        &result(vec![benchmark("example.com/app:v1", &[200, 300])]),
    )
    .unwrap();

    let written = analyze(&options(&output, vec![baseline, spegel], OutputFormat::Html)).unwrap();

    assert_eq!(
        written,
        vec![output.join("benchmark-1.html"), output.join("benchmark-1.json")]
    );
    let html = fs::read_to_string(output.join("benchmark-1.html")).unwrap();
    assert!(html.contains("<td>example.com/app:v1</td><td>baseline</td>"));
    assert!(html.contains("<td>example.com/app:v1</td><td>spegel</td>"));

    let spec: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.join("benchmark-1.json")).unwrap())
            .unwrap();
    assert_eq!(spec["title"], "Image Pull Duration");
    assert_eq!(spec["data"]["values"].as_array().unwrap().len(), 4);
}

#[test]
fn test_mismatched_benchmark_counts_write_nothing() {
    let root = tempfile::tempdir().unwrap();
    let a = root.path().join("a.json");
    let b = root.path().join("b.json");
    let output = root.path().join("charts");

    write_json(
        &a,
        &result(vec![benchmark("x:v1", &[1]), benchmark("y:v1", &[1])]),
    )
    .unwrap();
    write_json(&b, &result(vec![benchmark("x:v1", &[1])])).unwrap();

    let err = analyze(&options(&output, vec![a, b], OutputFormat::Html)).unwrap_err();
    assert!(matches!(err, BenchError::Mismatch(_)));
    assert_eq!(err.to_string(), "results cant have different benchmark counts");
    assert!(file_names(&output).is_empty());
}

#[test]
fn test_mismatched_measurement_counts_write_nothing() {
    let root = tempfile::tempdir().unwrap();
    let a = root.path().join("a.json");
    let b = root.path().join("b.json");
    let output = root.path().join("charts");

    write_json(&a, &result(vec![benchmark("x:v1", &[1, 2])])).unwrap();
    write_json(&b, &result(vec![benchmark("x:v1", &[1])])).unwrap();

    let err = analyze(&options(&output, vec![a, b], OutputFormat::Png)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "benchmarks cant have different measurement counts"
    );
    assert!(file_names(&output).is_empty());
}

#[test]
fn test_suites_compared_with_labels() {
    let root = tempfile::tempdir().unwrap();
    let output = root.path().join("charts");

    let suite = |name: &str, millis: u64| {
        let mut benchmarks = BTreeMap::new();
        benchmarks.insert(
            "10MB-1".to_string(),
            SuiteBenchmark {
                create: benchmark("ghcr.io/spegel-org/benchmark:v1-10MB-1", &[millis]),
                update: benchmark("ghcr.io/spegel-org/benchmark:v2-10MB-1", &[millis / 2]),
            },
        );
        Suite {
            name: name.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            kubernetes_version: "v1.31.0".to_string(),
            nodes: vec![],
            benchmarks,
        }
    };
    let first = root.path().join("suite-a.json");
    let second = root.path().join("suite-b.json");
    write_json(&first, &suite("a", 1000)).unwrap();
    write_json(&second, &suite("b", 400)).unwrap();

    let mut opts = options(&output, vec![first, second], OutputFormat::Html);
    opts.labels = vec!["containerd".to_string(), "spegel".to_string()];
    analyze(&opts).unwrap();

    let html = fs::read_to_string(output.join("suite-a.html")).unwrap();
    assert!(html.contains("<td>10MB-1 create</td><td>containerd</td>"));
    assert!(html.contains("<td>10MB-1 update</td><td>spegel</td>"));
}

#[test]
fn test_label_count_must_match_paths() {
    let root = tempfile::tempdir().unwrap();
    let a = root.path().join("a.json");
    let b = root.path().join("b.json");
    write_json(&a, &result(vec![])).unwrap();
    write_json(&b, &result(vec![])).unwrap();

    let mut opts = options(&root.path().join("charts"), vec![a, b], OutputFormat::Html);
    opts.labels = vec!["only-one".to_string()];
    assert!(matches!(analyze(&opts), Err(BenchError::Config(_))));
}

#[test]
fn test_timeline_requires_single_path() {
    let root = tempfile::tempdir().unwrap();
    let mut opts = options(
        root.path(),
        vec![root.path().join("a.json"), root.path().join("b.json")],
        OutputFormat::Html,
    );
    opts.timeline = true;
    assert!(matches!(analyze(&opts), Err(BenchError::Config(_))));
}

#[test]
fn test_timeline_html() {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("runs/benchmark-1.json");
    let output = root.path().join("charts");
    write_json(
        &input,
        &result(vec![benchmark("example.com/app:v1", &[900, 1200])]),
    )
    .unwrap();

    let mut opts = options(&output, vec![input], OutputFormat::Html);
    opts.timeline = true;
    let written = analyze(&opts).unwrap();
    assert_eq!(written[0], output.join("benchmark-1.html"));

    let html = fs::read_to_string(&written[0]).unwrap();
    assert!(html.contains("mean 1.05s, p75 1.20s, total 1.20s"));
}

#[test]
fn test_store_round_trip_detects_document_kind() {
    let root = tempfile::tempdir().unwrap();
    let path = root.path().join("result.json");
    let original = result(vec![benchmark("example.com/app:v1", &[873])]);
    write_json(&path, &original).unwrap();

    match read_document(&path).unwrap() {
        Document::Result(read) => assert_eq!(read, original),
        Document::Suite(_) => panic!("result read back as a suite"),
    }
}

#[test]
fn test_mismatched_images_write_nothing() {
    let root = tempfile::tempdir().unwrap();
    let a = root.path().join("a.json");
    let b = root.path().join("b.json");
    let output = root.path().join("charts");

    write_json(&a, &result(vec![benchmark("x:v1", &[100, 200])])).unwrap();
    write_json(&b, &result(vec![benchmark("x:v2", &[100, 200])])).unwrap();

    let err = analyze(&options(&output, vec![a, b], OutputFormat::Html)).unwrap_err();
    assert!(matches!(err, BenchError::Mismatch(_)));
    assert_eq!(
        err.to_string(),
        "benchmark images are not the same: x:v1 != x:v2"
    );
    assert!(file_names(&output).is_empty());
}

#[test]
fn test_png_comparison() {
    let root = tempfile::tempdir().unwrap();
    let baseline = root.path().join("baseline/benchmark-1.json");
    let spegel = root.path().join("spegel/benchmark-1.json");
    let output = root.path().join("charts");

    write_json(
        &baseline,
        &result(vec![
            benchmark("example.com/app:v1", &[900, 1100, 1000]),
            benchmark("example.com/app:v2", &[1200, 1300, 1250]),
        ]),
    )
    .unwrap();
    write_json(
        &spegel,
        &result(vec![
            benchmark("example.com/app:v1", &[200, 300, 250]),
            benchmark("example.com/app:v2", &[150, 180, 160]),
        ]),
    )
    .unwrap();

    let written = analyze(&options(&output, vec![baseline, spegel], OutputFormat::Png)).unwrap();

    assert_eq!(written, vec![output.join("benchmark-1.png")]);
    assert!(fs::metadata(&written[0]).unwrap().len() > 0);
    assert_eq!(file_names(&output), vec!["benchmark-1.png"]);
}

#[test]
fn test_png_timeline() {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("runs/benchmark-1.json");
    let output = root.path().join("charts");
    write_json(
        &input,
        &result(vec![
            benchmark("example.com/app:v1", &[900, 1200, 700]),
            benchmark("example.com/app:v2", &[400, 500, 450]),
        ]),
    )
    .unwrap();

    let mut opts = options(&output, vec![input], OutputFormat::Png);
    opts.timeline = true;
    let written = analyze(&opts).unwrap();

    assert_eq!(written, vec![output.join("benchmark-1.png")]);
    assert!(fs::metadata(&written[0]).unwrap().len() > 0);
}

#[test]
fn test_files_in_one_directory_get_their_own_labels() {
    let root = tempfile::tempdir().unwrap();
    let baseline = root.path().join("results/baseline.json");
    let spegel = root.path().join("results/spegel.json");
    let output = root.path().join("charts");

    write_json(
        &baseline,
        &result(vec![benchmark("example.com/app:v1", &[900, 1100])]),
    )
    .unwrap();
    write_json(
        &spegel,
        &result(vec![benchmark("example.com/app:v1", &[200, 300])]),
    )
    .unwrap();

    analyze(&options(&output, vec![baseline, spegel], OutputFormat::Html)).unwrap();

    let spec: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.join("baseline.json")).unwrap()).unwrap();
    let mut inputs: Vec<_> = spec["data"]["values"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["input"].as_str().unwrap().to_string())
        .collect();
    inputs.sort();
    inputs.dedup();
    assert_eq!(inputs, vec!["baseline", "spegel"]);
}

#[test]
fn test_duplicate_labels_are_rejected() {
    let root = tempfile::tempdir().unwrap();
    let a = root.path().join("a.json");
    let b = root.path().join("b.json");
    let output = root.path().join("charts");
    write_json(&a, &result(vec![benchmark("x:v1", &[1])])).unwrap();
    write_json(&b, &result(vec![benchmark("x:v1", &[1])])).unwrap();

    let mut opts = options(&output, vec![a, b], OutputFormat::Html);
    opts.labels = vec!["spegel".to_string(), "spegel".to_string()];
    assert!(matches!(analyze(&opts), Err(BenchError::Config(_))));
    assert!(file_names(&output).is_empty());
}
