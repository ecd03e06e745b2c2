//! Reading and writing result documents
//!
//! Documents are written as indented JSON through a temporary file in the
//! target directory that is renamed into place, so a reader never sees a
//! partially written file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::BenchResult;
use crate::models::{BenchmarkResult, Suite};

/// Either kind of document the tool writes
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Document {
    Suite(Suite),
    Result(BenchmarkResult),
}

/// `<dir>/benchmark-<unix-ts>.json`
pub fn result_path(dir: &Path, timestamp: DateTime<Utc>) -> PathBuf {
    dir.join(format!("benchmark-{}.json", timestamp.timestamp()))
}

/// `<dir>/<name>.json`
pub fn suite_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.json", name))
}

/// Serialize `value` as indented JSON and atomically replace `path`
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> BenchResult<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let json = serde_json::to_vec_pretty(value)?;
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(&json)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    info!(path = %path.display(), "wrote results");
    Ok(())
}

pub fn read_document(path: &Path) -> BenchResult<Document> {
    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    // suites carry a name and key their benchmarks by shape
    let is_suite = value.get("name").is_some()
        || value.get("benchmarks").is_some_and(Value::is_object);
    if is_suite {
        Ok(Document::Suite(serde_json::from_value(value)?))
    } else {
        Ok(Document::Result(serde_json::from_value(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_paths() {
        let ts = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();
        assert_eq!(
            result_path(Path::new("out"), ts),
            PathBuf::from("out/benchmark-1700000000.json")
        );
        assert_eq!(
            suite_path(Path::new("out"), "spegel"),
            PathBuf::from("out/spegel.json")
        );
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/result.json");
        write_json(&path, &BenchmarkResult::default()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  \"benchmarks\": []"));
        assert!(matches!(
            read_document(&path).unwrap(),
            Document::Result(_)
        ));
    }

    #[test]
    fn test_read_document_reports_missing_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suite.json");
        fs::write(
            &path,
            r#"{"name": "spegel", "timestamp": "2025-03-01T12:00:00Z", "benchmarks": {}}"#,
        )
        .unwrap();

        let err = read_document(&path).unwrap_err();
        assert!(
            err.to_string().contains("kubernetesVersion"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_read_document_reports_bad_result_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        fs::write(&path, r#"{"benchmarks": [{"measurements": []}]}"#).unwrap();

        let err = read_document(&path).unwrap_err();
        assert!(err.to_string().contains("image"), "unexpected error: {err}");
    }

    #[test]
    fn test_read_document_detects_suite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suite.json");
        fs::write(
            &path,
            r#"{"name": "spegel", "timestamp": "2025-03-01T12:00:00Z", "kubernetesVersion": "v1.31.0", "benchmarks": {}}"#,
        )
        .unwrap();

        match read_document(&path).unwrap() {
            Document::Suite(suite) => assert_eq!(suite.name, "spegel"),
            Document::Result(_) => panic!("suite read back as a result"),
        }
    }
}
