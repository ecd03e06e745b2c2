use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Benchmark, Node};

/// A named set of create/update measurements over several image shapes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Suite {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub kubernetes_version: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Keyed by `<size>-<layers>`
    pub benchmarks: BTreeMap<String, SuiteBenchmark>,
}

/// First pull of an image shape, then the pull of its successor version
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuiteBenchmark {
    pub create: Benchmark,
    pub update: Benchmark,
}

impl Suite {
    /// Flatten into an ordered list of labelled benchmarks
    pub fn series(&self) -> Vec<(String, &Benchmark)> {
        self.benchmarks
            .iter()
            .flat_map(|(key, b)| {
                [
                    (format!("{key} create"), &b.create),
                    (format!("{key} update"), &b.update),
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_order() {
        let mut benchmarks = BTreeMap::new();
        for key in ["1GB-1", "10MB-1"] {
            benchmarks.insert(
                key.to_string(),
                SuiteBenchmark {
                    create: Benchmark::new(format!("img:v1-{key}")),
                    update: Benchmark::new(format!("img:v2-{key}")),
                },
            );
        }
        let suite = Suite {
            name: "baseline".to_string(),
            timestamp: Utc::now(),
            kubernetes_version: "v1.31.0".to_string(),
            nodes: vec![],
            benchmarks,
        };

        let labels: Vec<_> = suite.series().into_iter().map(|(l, _)| l).collect();
        assert_eq!(
            labels,
            vec!["10MB-1 create", "10MB-1 update", "1GB-1 create", "1GB-1 update"]
        );
    }
}
