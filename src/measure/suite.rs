//! Create/update measurements over a grid of image shapes

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::info;

use super::runner::Measurer;
use crate::error::{BenchError, BenchResult};
use crate::k8s::resources::probe_name;
use crate::k8s::ClusterApi;
use crate::models::{Suite, SuiteBenchmark};

/// Layer counts each image size is measured with
pub const LAYER_COUNTS: [usize; 2] = [1, 4];

/// Image sizes as they appear in the published image tags
pub const IMAGE_SIZES: [&str; 3] = ["10MB", "100MB", "1GB"];

#[derive(Debug, Clone)]
pub struct SuiteOptions {
    pub name: String,
    pub registry: String,
    pub repository: String,
    /// Delay between two image shapes
    pub pause: Duration,
}

/// Key of one image shape in the suite document
pub fn suite_key(size: &str, layers: usize) -> String {
    format!("{}-{}", size, layers)
}

/// The `v1` (create) and `v2` (update) images of one shape
pub fn suite_images(registry: &str, repository: &str, size: &str, layers: usize) -> [String; 2] {
    [
        format!("{}/{}:v1-{}-{}", registry, repository, size, layers),
        format!("{}/{}:v2-{}-{}", registry, repository, size, layers),
    ]
}

/// Measure every shape in turn and gather the results into one suite
pub async fn run_suite<C: ClusterApi>(
    measurer: &Measurer<'_, C>,
    options: &SuiteOptions,
) -> BenchResult<Suite> {
    let metadata = measurer.collect_metadata().await?;
    let mut benchmarks = BTreeMap::new();

    let shapes: Vec<_> = LAYER_COUNTS
        .iter()
        .flat_map(|&layers| IMAGE_SIZES.iter().map(move |&size| (size, layers)))
        .collect();

    for (i, (size, layers)) in shapes.iter().enumerate() {
        if i > 0 {
            tokio::select! {
                biased;
                _ = measurer.cancel_token().cancelled() => return Err(BenchError::Cancelled),
                _ = tokio::time::sleep(options.pause) => {}
            }
        }

        let images = suite_images(&options.registry, &options.repository, size, *layers);
        info!(layers, size, "measurement started");

        let probe = probe_name(chrono::Utc::now().timestamp());
        let mut measured = measurer.measure_images(&probe, &images).await?.into_iter();
        let (Some(create), Some(update)) = (measured.next(), measured.next()) else {
            return Err(BenchError::mismatch(format!(
                "expected two benchmarks for {}",
                suite_key(size, *layers)
            )));
        };
        benchmarks.insert(suite_key(size, *layers), SuiteBenchmark { create, update });

        info!(layers, size, "measurement completed");
    }

    Ok(Suite {
        name: options.name.clone(),
        timestamp: metadata.timestamp,
        kubernetes_version: metadata.kubernetes_version,
        nodes: metadata.nodes,
        benchmarks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_images() {
        let [v1, v2] = suite_images("ghcr.io", "spegel-org/benchmark", "100MB", 4);
        assert_eq!(v1, "ghcr.io/spegel-org/benchmark:v1-100MB-4");
        assert_eq!(v2, "ghcr.io/spegel-org/benchmark:v2-100MB-4");
    }

    #[test]
    fn test_suite_key() {
        assert_eq!(suite_key("1GB", 1), "1GB-1");
    }
}
