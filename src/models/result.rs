use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};

/// Top-level record of one measurement run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub benchmarks: Vec<Benchmark>,
}

/// Cluster snapshot taken when the run started
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub timestamp: DateTime<Utc>,
    pub kubernetes_version: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// An untainted cluster node at run time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub instance_type: String,
    /// Memory capacity in bytes
    pub memory: i64,
    /// CPU capacity in whole cores
    pub cpu: i64,
}

/// Pull measurements of one image across all nodes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Benchmark {
    pub image: String,
    #[serde(default)]
    pub measurements: Vec<Measurement>,
}

impl Benchmark {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            measurements: Vec::new(),
        }
    }

    /// Pull durations in seconds, in measurement order
    pub fn durations_secs(&self) -> Vec<f64> {
        self.measurements
            .iter()
            .map(|m| m.duration.as_secs_f64())
            .collect()
    }
}

/// A single image pull on a single node
///
/// `stop` is always `start + duration`; both come from the pod's events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    #[serde(with = "super::duration_nanos")]
    pub duration: Duration,
}

impl Measurement {
    pub fn new(start: DateTime<Utc>, duration: Duration) -> BenchResult<Self> {
        let delta = chrono::Duration::from_std(duration)
            .map_err(|_| BenchError::InvalidDuration(format!("{duration:?}")))?;
        let stop = start
            .checked_add_signed(delta)
            .ok_or_else(|| BenchError::InvalidDuration(format!("{duration:?}")))?;
        Ok(Self {
            start,
            stop,
            duration,
        })
    }
}
