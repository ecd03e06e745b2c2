//! Kubernetes client wrapper for pull benchmarks

use std::path::Path;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::DaemonSet;
use k8s_openapi::api::core::v1::{ConfigMap, Event, Namespace, Node, Pod};
use kube::{
    api::{Api, DeleteParams, ListParams, PostParams},
    config::{KubeConfigOptions, Kubeconfig},
    Client, Config,
};
use tracing::{info, instrument};

use super::cluster::ClusterApi;
use super::resources::managed_labels;
use crate::error::{BenchError, BenchResult};

/// Wrapper around kube::Client bound to the benchmark namespace
#[derive(Clone)]
pub struct K8sClient {
    client: Client,
    namespace: String,
}

impl K8sClient {
    /// Connect using an explicit kubeconfig, or the inferred config when none is given
    #[instrument(skip_all)]
    pub async fn new(kubeconfig: Option<&Path>, namespace: &str) -> BenchResult<Self> {
        let config = match kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path)?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
            }
            None => Config::infer()
                .await
                .map_err(|e| BenchError::config(format!("could not infer kubeconfig: {e}")))?,
        };
        let client = Client::try_from(config)?;

        info!(namespace, "Connected to Kubernetes cluster");

        Ok(Self {
            client,
            namespace: namespace.to_string(),
        })
    }

    /// Get the namespace this client operates in
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn daemon_sets(&self) -> Api<DaemonSet> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn config_maps(&self) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn events(&self) -> Api<Event> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }
}

/// Map a 404 on delete to success
fn ignore_not_found<T>(result: Result<T, kube::Error>) -> BenchResult<()> {
    match result.map_err(BenchError::from) {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl ClusterApi for K8sClient {
    async fn server_version(&self) -> BenchResult<String> {
        let version = self.client.apiserver_version().await?;
        Ok(version.git_version)
    }

    async fn list_nodes(&self) -> BenchResult<Vec<Node>> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        Ok(nodes.list(&ListParams::default()).await?.items)
    }

    #[instrument(skip(self), fields(namespace = %self.namespace))]
    async fn ensure_namespace(&self) -> BenchResult<()> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        if namespaces.get_opt(&self.namespace).await?.is_some() {
            return Ok(());
        }

        let ns = Namespace {
            metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                name: Some(self.namespace.clone()),
                labels: Some(managed_labels()),
                ..Default::default()
            },
            ..Default::default()
        };

        match namespaces
            .create(&PostParams::default(), &ns)
            .await
            .map_err(BenchError::from)
        {
            Ok(_) => {
                info!("Created namespace");
            }
            Err(e) if e.is_conflict() => {
                info!("Namespace already exists");
            }
            Err(e) => return Err(e),
        }

        Ok(())
    }

    #[instrument(skip(self, config_map), fields(name = %config_map.metadata.name.as_deref().unwrap_or("unknown")))]
    async fn create_config_map(&self, config_map: &ConfigMap) -> BenchResult<()> {
        self.config_maps()
            .create(&PostParams::default(), config_map)
            .await?;
        info!("Created config map");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_config_map(&self, name: &str) -> BenchResult<()> {
        ignore_not_found(
            self.config_maps()
                .delete(name, &DeleteParams::background())
                .await,
        )?;
        info!(name, "Deleted config map");
        Ok(())
    }

    async fn get_daemon_set(&self, name: &str) -> BenchResult<Option<DaemonSet>> {
        Ok(self.daemon_sets().get_opt(name).await?)
    }

    #[instrument(skip(self, daemon_set), fields(name = %daemon_set.metadata.name.as_deref().unwrap_or("unknown")))]
    async fn create_daemon_set(&self, daemon_set: &DaemonSet) -> BenchResult<DaemonSet> {
        let created = self
            .daemon_sets()
            .create(&PostParams::default(), daemon_set)
            .await?;
        info!("Created daemon set");
        Ok(created)
    }

    #[instrument(skip(self, daemon_set), fields(name = %daemon_set.metadata.name.as_deref().unwrap_or("unknown")))]
    async fn replace_daemon_set(&self, daemon_set: &DaemonSet) -> BenchResult<DaemonSet> {
        let name = daemon_set
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| BenchError::config("daemon set has no name"))?;
        let updated = self
            .daemon_sets()
            .replace(name, &PostParams::default(), daemon_set)
            .await?;
        info!("Updated daemon set");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete_daemon_set(&self, name: &str) -> BenchResult<()> {
        ignore_not_found(
            self.daemon_sets()
                .delete(name, &DeleteParams::background())
                .await,
        )?;
        info!(name, "Deleted daemon set");
        Ok(())
    }

    async fn list_pods(&self, label_selector: &str) -> BenchResult<Vec<Pod>> {
        let list = self
            .pods()
            .list(&ListParams::default().labels(label_selector))
            .await?;
        Ok(list.items)
    }

    async fn list_pod_events(&self, pod_name: &str) -> BenchResult<Vec<Event>> {
        let selector = format!("involvedObject.name={},involvedObject.kind=Pod", pod_name);
        let list = self
            .events()
            .list(&ListParams::default().fields(&selector))
            .await?;
        Ok(list.items)
    }
}
