//! Kubernetes resource builders for pull benchmarks
//!
//! Functions to create the image cleanup ConfigMap/DaemonSet and the probe
//! DaemonSet that pulls the image under test on every node

use k8s_openapi::api::apps::v1::{DaemonSet, DaemonSetSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapVolumeSource, Container, HostPathVolumeSource, PodSpec, PodTemplateSpec,
    Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;

/// Name shared by the cleanup ConfigMap and DaemonSet
pub const CLEAR_IMAGE_NAME: &str = "pull-benchmark-clear-image";

/// Prefix of the probe DaemonSet name
pub const PROBE_PREFIX: &str = "pull-benchmark";

/// Container name inside the probe DaemonSet
pub const PROBE_CONTAINER: &str = "benchmark";

const SCRIPT_KEY: &str = "run.sh";

/// Labels put on everything this tool creates
pub fn managed_labels() -> BTreeMap<String, String> {
    [(
        "app.kubernetes.io/managed-by".to_string(),
        "pull-benchmark".to_string(),
    )]
    .into_iter()
    .collect()
}

fn app_labels(app: &str) -> BTreeMap<String, String> {
    let mut labels = managed_labels();
    labels.insert("app".to_string(), app.to_string());
    labels
}

/// Label selector matching the pods of a DaemonSet built here
pub fn app_selector(app: &str) -> String {
    format!("app={}", app)
}

/// Name of the probe DaemonSet for a run started at `unix_ts`
pub fn probe_name(unix_ts: i64) -> String {
    format!("{}-{}", PROBE_PREFIX, unix_ts)
}

/// Shell script removing the given images from the host's container runtime
pub fn clear_image_script(images: &[String]) -> String {
    let remove_images = format!("crictl rmi {} || true", images.join(" "));
    format!(
        r#"#!/bin/sh
chroot /host /bin/bash -c '{}'
echo "Cleanup run"
sleep infinity &
wait $!"#,
        remove_images
    )
}

/// ConfigMap holding the cleanup script
pub fn create_clear_image_config_map(images: &[String]) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(CLEAR_IMAGE_NAME.to_string()),
            labels: Some(managed_labels()),
            ..Default::default()
        },
        data: Some(
            [(SCRIPT_KEY.to_string(), clear_image_script(images))]
                .into_iter()
                .collect(),
        ),
        ..Default::default()
    }
}

/// DaemonSet that runs the cleanup script against the host root on every node
pub fn create_clear_image_daemon_set(cleanup_image: &str) -> DaemonSet {
    let labels = app_labels(CLEAR_IMAGE_NAME);

    let container = Container {
        name: "clear".to_string(),
        image: Some(cleanup_image.to_string()),
        image_pull_policy: Some("IfNotPresent".to_string()),
        command: Some(vec![format!("/scripts/{}", SCRIPT_KEY)]),
        stdin: Some(true),
        volume_mounts: Some(vec![
            VolumeMount {
                name: "scripts".to_string(),
                mount_path: format!("/scripts/{}", SCRIPT_KEY),
                sub_path: Some(SCRIPT_KEY.to_string()),
                ..Default::default()
            },
            VolumeMount {
                name: "host-root".to_string(),
                mount_path: "/host".to_string(),
                ..Default::default()
            },
        ]),
        ..Default::default()
    };

    let volumes = vec![
        Volume {
            name: "scripts".to_string(),
            config_map: Some(ConfigMapVolumeSource {
                name: Some(CLEAR_IMAGE_NAME.to_string()),
                default_mode: Some(0o755),
                ..Default::default()
            }),
            ..Default::default()
        },
        Volume {
            name: "host-root".to_string(),
            host_path: Some(HostPathVolumeSource {
                path: "/".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        },
    ];

    daemon_set(
        CLEAR_IMAGE_NAME,
        labels,
        PodSpec {
            containers: vec![container],
            volumes: Some(volumes),
            ..Default::default()
        },
    )
}

/// DaemonSet whose only container runs the image under test
pub fn create_probe_daemon_set(name: &str, image: &str) -> DaemonSet {
    let container = Container {
        name: PROBE_CONTAINER.to_string(),
        image: Some(image.to_string()),
        image_pull_policy: Some("IfNotPresent".to_string()),
        // Keep container running
        stdin: Some(true),
        ..Default::default()
    };

    daemon_set(
        name,
        app_labels(name),
        PodSpec {
            containers: vec![container],
            ..Default::default()
        },
    )
}

/// Point the probe container at another image; returns false if the spec has no containers
pub fn set_probe_image(daemon_set: &mut DaemonSet, image: &str) -> bool {
    let container = daemon_set
        .spec
        .as_mut()
        .and_then(|s| s.template.spec.as_mut())
        .and_then(|s| s.containers.first_mut());
    match container {
        Some(container) => {
            container.image = Some(image.to_string());
            true
        }
        None => false,
    }
}

fn daemon_set(name: &str, labels: BTreeMap<String, String>, pod_spec: PodSpec) -> DaemonSet {
    DaemonSet {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(managed_labels()),
            ..Default::default()
        },
        spec: Some(DaemonSetSpec {
            selector: LabelSelector {
                match_labels: Some(
                    [("app".to_string(), name.to_string())]
                        .into_iter()
                        .collect(),
                ),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(pod_spec),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}
