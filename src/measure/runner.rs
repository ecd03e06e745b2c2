//! Image pull measurement against a live cluster

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use super::events::{event_time, find_event, parse_pull_message, PULLED_REASON, PULLING_REASON};
use super::nodes::collect_nodes;
use crate::config::Config;
use crate::error::{BenchError, BenchResult};
use crate::k8s::resources::{
    app_selector, create_clear_image_config_map, create_clear_image_daemon_set,
    create_probe_daemon_set, probe_name, set_probe_image, CLEAR_IMAGE_NAME,
};
use crate::k8s::{compute_daemon_set_status, ClusterApi, Poller};
use crate::models::{Benchmark, BenchmarkResult, Measurement, Metadata};

/// Deadline for deleting resources once the measurement is over
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct MeasureOptions {
    pub poll_interval: Duration,
    pub cleanup_timeout: Duration,
    pub rollout_timeout: Duration,
    pub cleanup_image: String,
}

impl From<&Config> for MeasureOptions {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            cleanup_timeout: config.cleanup_timeout(),
            rollout_timeout: config.rollout_timeout(),
            cleanup_image: config.cleanup_image.clone(),
        }
    }
}

impl Default for MeasureOptions {
    fn default() -> Self {
        MeasureOptions::from(&Config::default())
    }
}

/// Measures pull latency of images, one at a time, on every schedulable node
pub struct Measurer<'a, C: ClusterApi> {
    cluster: &'a C,
    options: MeasureOptions,
    cancel: CancellationToken,
}

impl<'a, C: ClusterApi> Measurer<'a, C> {
    pub fn new(cluster: &'a C, options: MeasureOptions, cancel: CancellationToken) -> Self {
        Self {
            cluster,
            options,
            cancel,
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Server version, timestamp, and untainted node inventory
    pub async fn collect_metadata(&self) -> BenchResult<Metadata> {
        let kubernetes_version = self.cluster.server_version().await?;
        let nodes = self.cluster.list_nodes().await?;
        Ok(Metadata {
            timestamp: Utc::now(),
            kubernetes_version,
            nodes: collect_nodes(&nodes),
        })
    }

    /// Collect metadata and measure every image in order
    pub async fn run(&self, images: &[String]) -> BenchResult<BenchmarkResult> {
        let metadata = self.collect_metadata().await?;
        let probe = probe_name(metadata.timestamp.timestamp());
        let benchmarks = self.measure_images(&probe, images).await?;
        Ok(BenchmarkResult {
            metadata: Some(metadata),
            benchmarks,
        })
    }

    /// Clear caches, measure each image with the probe DaemonSet, then clean up
    #[instrument(skip(self, images), fields(probe = %probe))]
    pub async fn measure_images(
        &self,
        probe: &str,
        images: &[String],
    ) -> BenchResult<Vec<Benchmark>> {
        self.cluster.ensure_namespace().await?;
        self.clear_images(images).await?;

        let measured = self.measure_each(probe, images).await;
        teardown("measure daemon set", self.cluster.delete_daemon_set(probe)).await;
        let benchmarks = measured?;

        self.clear_images(images).await?;
        Ok(benchmarks)
    }

    async fn measure_each(&self, probe: &str, images: &[String]) -> BenchResult<Vec<Benchmark>> {
        let mut benchmarks = Vec::with_capacity(images.len());
        for image in images {
            if self.cancel.is_cancelled() {
                return Err(BenchError::Cancelled);
            }
            benchmarks.push(self.measure_image_pull(probe, image).await?);
        }
        Ok(benchmarks)
    }

    /// Remove the images from every node's runtime
    #[instrument(skip_all)]
    pub async fn clear_images(&self, images: &[String]) -> BenchResult<()> {
        info!("clearing images");

        let config_map = create_clear_image_config_map(images);
        self.cluster.create_config_map(&config_map).await?;

        let daemon_set = create_clear_image_daemon_set(&self.options.cleanup_image);
        let result = match self.cluster.create_daemon_set(&daemon_set).await {
            Ok(_) => {
                self.wait_for_rollout(CLEAR_IMAGE_NAME, self.options.cleanup_timeout)
                    .await
            }
            Err(e) => Err(e),
        };

        teardown(
            "image cleanup daemon set",
            self.cluster.delete_daemon_set(CLEAR_IMAGE_NAME),
        )
        .await;
        teardown(
            "image cleanup config map",
            self.cluster.delete_config_map(CLEAR_IMAGE_NAME),
        )
        .await;

        result
    }

    #[instrument(skip(self, probe))]
    async fn measure_image_pull(&self, probe: &str, image: &str) -> BenchResult<Benchmark> {
        info!("measuring pull performance");

        match self.cluster.get_daemon_set(probe).await? {
            None => {
                let daemon_set = create_probe_daemon_set(probe, image);
                self.cluster.create_daemon_set(&daemon_set).await?;
            }
            Some(mut daemon_set) => {
                if !set_probe_image(&mut daemon_set, image) {
                    return Err(BenchError::config(format!(
                        "daemon set {probe} has no container to update"
                    )));
                }
                self.cluster.replace_daemon_set(&daemon_set).await?;
            }
        }

        info!("waiting for rollout completion");
        self.wait_for_rollout(probe, self.options.rollout_timeout)
            .await?;

        info!("collecting image pull durations");
        self.collect_pull_durations(probe, image).await
    }

    async fn wait_for_rollout(&self, name: &str, timeout: Duration) -> BenchResult<()> {
        let poller = Poller::new(self.options.poll_interval, timeout);
        poller
            .poll_until(&format!("rollout of {name}"), &self.cancel, move || async move {
                let daemon_set = self
                    .cluster
                    .get_daemon_set(name)
                    .await?
                    .ok_or_else(|| BenchError::NotFound(format!("daemon set {name}")))?;
                let status = compute_daemon_set_status(&daemon_set);
                if status.is_current() {
                    return Ok(Some(()));
                }
                info!(name, state = %status.state, message = %status.message, "waiting for rollout");
                Ok(None)
            })
            .await
    }

    async fn collect_pull_durations(&self, probe: &str, image: &str) -> BenchResult<Benchmark> {
        let pods = self.cluster.list_pods(&app_selector(probe)).await?;
        // pods of the previous image may still be terminating
        let pods: Vec<_> = pods
            .into_iter()
            .filter(|pod| pod.metadata.deletion_timestamp.is_none())
            .filter(|pod| {
                pod.spec
                    .as_ref()
                    .and_then(|s| s.containers.first())
                    .and_then(|c| c.image.as_deref())
                    .map_or(true, |i| i == image)
            })
            .collect();
        if pods.is_empty() {
            return Err(BenchError::EmptyPodList);
        }

        let mut bench = Benchmark::new(image);
        for pod in &pods {
            let pod_name = pod.metadata.name.as_deref().unwrap_or_default();
            let events = self.cluster.list_pod_events(pod_name).await?;

            let pulling = find_event(&events, PULLING_REASON)?;
            let pulled = find_event(&events, PULLED_REASON)?;
            let duration = parse_pull_message(pulled.message.as_deref().unwrap_or_default())?;
            let start = event_time(pulling)
                .ok_or_else(|| BenchError::MissingTimestamp(PULLING_REASON.to_string()))?;

            bench.measurements.push(Measurement::new(start, duration)?);
        }
        Ok(bench)
    }
}

/// Await a deletion with a short deadline; failures are only logged
async fn teardown<F>(what: &str, delete: F)
where
    F: Future<Output = BenchResult<()>>,
{
    match tokio::time::timeout(TEARDOWN_TIMEOUT, delete).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "could not delete {}", what),
        Err(_) => warn!("timed out deleting {}", what),
    }
}
