//! Kubernetes integration for pull benchmarks
//!
//! This module handles all interactions with the cluster under test:
//! - Building the cleanup and probe DaemonSets
//! - Computing DaemonSet rollout status
//! - Polling for rollout completion with a deadline
//! - The `ClusterApi` seam and its kube-backed implementation

mod client;
mod cluster;
pub mod poll;
pub mod resources;
pub mod status;

pub use client::K8sClient;
pub use cluster::ClusterApi;
#[cfg(test)]
pub use cluster::MockClusterApi;
pub use poll::Poller;
pub use status::{compute_daemon_set_status, RolloutState, RolloutStatus};
