//! The set of cluster operations the measurer needs

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::DaemonSet;
use k8s_openapi::api::core::v1::{ConfigMap, Event, Node, Pod};

use crate::error::BenchResult;

/// Cluster operations scoped to the benchmark namespace
///
/// Creates tolerate nothing; deletes treat "not found" as success.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// `gitVersion` of the api server
    async fn server_version(&self) -> BenchResult<String>;

    async fn list_nodes(&self) -> BenchResult<Vec<Node>>;

    /// Create the namespace unless it already exists
    async fn ensure_namespace(&self) -> BenchResult<()>;

    async fn create_config_map(&self, config_map: &ConfigMap) -> BenchResult<()>;

    async fn delete_config_map(&self, name: &str) -> BenchResult<()>;

    async fn get_daemon_set(&self, name: &str) -> BenchResult<Option<DaemonSet>>;

    async fn create_daemon_set(&self, daemon_set: &DaemonSet) -> BenchResult<DaemonSet>;

    async fn replace_daemon_set(&self, daemon_set: &DaemonSet) -> BenchResult<DaemonSet>;

    async fn delete_daemon_set(&self, name: &str) -> BenchResult<()>;

    async fn list_pods(&self, label_selector: &str) -> BenchResult<Vec<Pod>>;

    /// Events whose involved object is the named pod
    async fn list_pod_events(&self, pod_name: &str) -> BenchResult<Vec<Event>>;
}
