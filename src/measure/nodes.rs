//! Node inventory captured with each run

use k8s_openapi::api::core::v1::Node as K8sNode;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use tracing::info;

use crate::models::Node;

const INSTANCE_TYPE_LABEL: &str = "node.kubernetes.io/instance-type";

/// Untainted nodes only; tainted nodes would not run the probe pod anyway
pub fn collect_nodes(nodes: &[K8sNode]) -> Vec<Node> {
    nodes
        .iter()
        .filter_map(|node| {
            let name = node.metadata.name.clone().unwrap_or_default();
            let tainted = node
                .spec
                .as_ref()
                .and_then(|s| s.taints.as_ref())
                .is_some_and(|t| !t.is_empty());
            if tainted {
                info!(name, "skipping node with taint");
                return None;
            }

            let instance_type = node
                .metadata
                .labels
                .as_ref()
                .and_then(|l| l.get(INSTANCE_TYPE_LABEL))
                .cloned()
                .unwrap_or_default();
            let capacity = node.status.as_ref().and_then(|s| s.capacity.as_ref());
            let quantity = |key: &str| {
                capacity
                    .and_then(|c| c.get(key))
                    .and_then(parse_quantity)
                    .unwrap_or(0)
            };

            Some(Node {
                name,
                instance_type,
                memory: quantity("memory"),
                cpu: quantity("cpu"),
            })
        })
        .collect()
}

/// Integer value of a resource quantity, rounded up (`3800m` is 4, `16Ki` is 16384)
pub fn parse_quantity(quantity: &Quantity) -> Option<i64> {
    let s = quantity.0.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(split);
    let number: f64 = number.parse().ok()?;

    let multiplier = match suffix {
        "" => 1.0,
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        "Ki" => 1024.0,
        "Mi" => 1024.0_f64.powi(2),
        "Gi" => 1024.0_f64.powi(3),
        "Ti" => 1024.0_f64.powi(4),
        "Pi" => 1024.0_f64.powi(5),
        "Ei" => 1024.0_f64.powi(6),
        exp if exp.starts_with(['e', 'E']) => 10f64.powi(exp[1..].parse().ok()?),
        _ => return None,
    };

    Some((number * multiplier).ceil() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{NodeSpec, NodeStatus, Taint};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn node(name: &str, taints: Option<Vec<Taint>>) -> K8sNode {
        K8sNode {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(
                    [(INSTANCE_TYPE_LABEL.to_string(), "m5.large".to_string())]
                        .into_iter()
                        .collect(),
                ),
                ..Default::default()
            },
            spec: Some(NodeSpec {
                taints,
                ..Default::default()
            }),
            status: Some(NodeStatus {
                capacity: Some(
                    [
                        ("cpu".to_string(), Quantity("2".to_string())),
                        ("memory".to_string(), Quantity("8Gi".to_string())),
                    ]
                    .into_iter()
                    .collect(),
                ),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_collect_nodes_skips_tainted() {
        let taint = Taint {
            key: "node-role.kubernetes.io/control-plane".to_string(),
            effect: "NoSchedule".to_string(),
            ..Default::default()
        };
        let nodes = vec![
            node("control-plane", Some(vec![taint])),
            node("worker-1", None),
            node("worker-2", Some(vec![])),
        ];

        let collected = collect_nodes(&nodes);
        let names: Vec<_> = collected.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["worker-1", "worker-2"]);
        assert_eq!(collected[0].instance_type, "m5.large");
        assert_eq!(collected[0].cpu, 2);
        assert_eq!(collected[0].memory, 8 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_quantity() {
        let q = |s: &str| parse_quantity(&Quantity(s.to_string()));
        assert_eq!(q("4"), Some(4));
        assert_eq!(q("3800m"), Some(4));
        assert_eq!(q("16Ki"), Some(16384));
        assert_eq!(q("16329764Ki"), Some(16_721_678_336));
        assert_eq!(q("1G"), Some(1_000_000_000));
        assert_eq!(q("1e3"), Some(1000));
        assert_eq!(q("banana"), None);
        assert_eq!(q("5Zi"), None);
    }
}
