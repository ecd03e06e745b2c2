use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_cleanup_timeout_secs")]
    pub cleanup_timeout_secs: u64,

    #[serde(default = "default_rollout_timeout_secs")]
    pub rollout_timeout_secs: u64,

    #[serde(default = "default_suite_registry")]
    pub suite_registry: String,

    #[serde(default = "default_suite_repository")]
    pub suite_repository: String,

    #[serde(default = "default_suite_pause_secs")]
    pub suite_pause_secs: u64,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default = "default_base_image")]
    pub base_image: String,

    #[serde(default = "default_cleanup_image")]
    pub cleanup_image: String,
}

fn default_namespace() -> String {
    "pull-benchmark".to_string()
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_cleanup_timeout_secs() -> u64 {
    10 * 60
}

fn default_rollout_timeout_secs() -> u64 {
    30 * 60
}

fn default_suite_registry() -> String {
    "ghcr.io".to_string()
}

fn default_suite_repository() -> String {
    "spegel-org/benchmark".to_string()
}

fn default_suite_pause_secs() -> u64 {
    3
}

fn default_base_image() -> String {
    "registry.k8s.io/pause:3.7".to_string()
}

fn default_cleanup_image() -> String {
    "docker.io/library/alpine:3.21.3@sha256:a8560b36e8b8210634f77d9f7f9efd7ffa463e380b75e2e74aff4511df3ef88c"
        .to_string()
}

impl Config {
    /// Load from `.env` and `PULL_BENCHMARK_*` environment variables
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("PULL_BENCHMARK").try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn cleanup_timeout(&self) -> Duration {
        Duration::from_secs(self.cleanup_timeout_secs)
    }

    pub fn rollout_timeout(&self) -> Duration {
        Duration::from_secs(self.rollout_timeout_secs)
    }

    pub fn suite_pause(&self) -> Duration {
        Duration::from_secs(self.suite_pause_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            poll_interval_secs: default_poll_interval_secs(),
            cleanup_timeout_secs: default_cleanup_timeout_secs(),
            rollout_timeout_secs: default_rollout_timeout_secs(),
            suite_registry: default_suite_registry(),
            suite_repository: default_suite_repository(),
            suite_pause_secs: default_suite_pause_secs(),
            log_format: LogFormat::default(),
            base_image: default_base_image(),
            cleanup_image: default_cleanup_image(),
        }
    }
}
