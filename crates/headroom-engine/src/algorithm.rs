//! The pluggable placement algorithm.
//!
//! The engine only invokes and observes the algorithm; swapping in a
//! different scoring strategy does not touch the control loop.

use headroom_state::{NodeRecord, WorkloadInstance};
use tracing::debug;

use crate::scorer::{ScoringWeights, fits, missing_resources, rank_nodes};

/// Outcome of a placement decision for one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// The instance should be placed on this node.
    Node(String),
    /// No node can take the instance; `reason` and `message` are recorded
    /// verbatim on the instance's terminal condition.
    Unfeasible { reason: String, message: String },
}

/// Decides a placement target for one workload instance.
pub trait PlacementAlgorithm: Send + Sync {
    fn select_node(&self, instance: &WorkloadInstance, nodes: &[NodeRecord]) -> Placement;
}

/// Default algorithm: weighted bin-packing over feasible nodes.
#[derive(Debug, Default)]
pub struct BinPackingAlgorithm {
    weights: ScoringWeights,
}

impl BinPackingAlgorithm {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }
}

impl PlacementAlgorithm for BinPackingAlgorithm {
    fn select_node(&self, instance: &WorkloadInstance, nodes: &[NodeRecord]) -> Placement {
        let ranked = rank_nodes(nodes, instance, &self.weights);
        if let Some(best) = ranked.first() {
            debug!(
                instance = %instance.name,
                node = %best.node_id,
                score = best.score,
                candidates = ranked.len(),
                "node selected"
            );
            return Placement::Node(best.node_id.clone());
        }

        Placement::Unfeasible {
            reason: "Unschedulable".to_string(),
            message: unfeasible_message(instance, nodes),
        }
    }
}

/// Build the human-readable message for a workload no node can take.
///
/// Names the insufficient resources on nodes that passed the label and
/// draining checks ("Insufficient cpu"); falls back to a generic message
/// when no node was even a candidate.
fn unfeasible_message(instance: &WorkloadInstance, nodes: &[NodeRecord]) -> String {
    let mut insufficient: Vec<&'static str> = Vec::new();
    for node in nodes {
        if node.draining {
            continue;
        }
        let labels_ok = instance
            .required_labels
            .iter()
            .all(|(k, v)| node.labels.get(k).is_some_and(|nv| nv == v));
        if !labels_ok {
            continue;
        }
        if fits(node, instance) {
            continue;
        }
        for res in missing_resources(node, instance) {
            if !insufficient.contains(&res) {
                insufficient.push(res);
            }
        }
    }

    if insufficient.is_empty() {
        return "No node matches the workload constraints".to_string();
    }
    insufficient
        .iter()
        .map(|res| format!("Insufficient {res}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use headroom_state::{InstanceCondition, InstancePhase, ResourceRequests};
    use std::collections::HashMap;

    fn node(id: &str, cap_mem: u64, used_mem: u64, cap_cpu: u32, used_cpu: u32) -> NodeRecord {
        NodeRecord {
            id: id.to_string(),
            labels: HashMap::new(),
            capacity_memory_bytes: cap_mem,
            capacity_cpu_weight: cap_cpu,
            used_memory_bytes: used_mem,
            used_cpu_weight: used_cpu,
            draining: false,
        }
    }

    fn instance(mem: u64, cpu: u32) -> WorkloadInstance {
        WorkloadInstance {
            name: "web-0".to_string(),
            namespace: "default".to_string(),
            uid: String::new(),
            engine: String::new(),
            requests: ResourceRequests {
                memory_bytes: mem,
                cpu_weight: cpu,
            },
            required_labels: HashMap::new(),
            preferred_labels: HashMap::new(),
            annotations: HashMap::new(),
            node_name: None,
            phase: InstancePhase::Pending,
            scheduled: InstanceCondition::default(),
        }
    }

    #[test]
    fn selects_a_feasible_node() {
        let algo = BinPackingAlgorithm::default();
        let nodes = vec![node("n1", 1024, 0, 100, 0)];
        assert_eq!(
            algo.select_node(&instance(128, 10), &nodes),
            Placement::Node("n1".to_string())
        );
    }

    #[test]
    fn exhausted_cpu_reports_insufficient_cpu() {
        let algo = BinPackingAlgorithm::default();
        // Plenty of memory everywhere, no cpu left anywhere.
        let nodes = vec![node("n1", 1024, 0, 100, 100), node("n2", 1024, 0, 50, 50)];
        assert_eq!(
            algo.select_node(&instance(128, 10), &nodes),
            Placement::Unfeasible {
                reason: "Unschedulable".to_string(),
                message: "Insufficient cpu".to_string(),
            }
        );
    }

    #[test]
    fn exhausted_both_reports_both() {
        let algo = BinPackingAlgorithm::default();
        let nodes = vec![node("n1", 1024, 1024, 100, 100)];
        assert_eq!(
            algo.select_node(&instance(128, 10), &nodes),
            Placement::Unfeasible {
                reason: "Unschedulable".to_string(),
                message: "Insufficient cpu, Insufficient memory".to_string(),
            }
        );
    }

    #[test]
    fn empty_cluster_reports_no_match() {
        let algo = BinPackingAlgorithm::default();
        match algo.select_node(&instance(128, 10), &[]) {
            Placement::Unfeasible { reason, message } => {
                assert_eq!(reason, "Unschedulable");
                assert_eq!(message, "No node matches the workload constraints");
            }
            other => panic!("unexpected placement: {other:?}"),
        }
    }

    #[test]
    fn label_mismatch_reports_no_match() {
        let algo = BinPackingAlgorithm::default();
        let mut inst = instance(128, 10);
        inst.required_labels
            .insert("zone".to_string(), "eu-1".to_string());
        // The node has room but the wrong labels; no resource complaint.
        match algo.select_node(&inst, &[node("n1", 1024, 0, 100, 0)]) {
            Placement::Unfeasible { message, .. } => {
                assert_eq!(message, "No node matches the workload constraints");
            }
            other => panic!("unexpected placement: {other:?}"),
        }
    }
}
