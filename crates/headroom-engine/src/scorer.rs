//! Node scoring for placement decisions.
//!
//! Evaluates candidate nodes for a single workload instance using a weighted
//! combination of:
//! - **Bin-packing** (best-fit): prefer nodes that will be most full after placement
//! - **Affinity**: prefer nodes whose labels match the instance's preferences
//! - **Balance**: penalize nodes far above average utilization
//!
//! A node is feasible when it is not draining, matches all required labels,
//! and has free memory and cpu for one instance.

use headroom_state::{NodeRecord, WorkloadInstance};

/// Scored placement candidate.
#[derive(Debug, Clone)]
pub struct NodeScore {
    pub node_id: String,
    /// Composite score (higher = better). Range: 0.0..=100.0.
    pub score: f64,
}

/// Weights for the scoring components.
#[derive(Debug, Clone)]
pub struct ScoringWeights {
    pub bin_packing: f64,
    pub affinity: f64,
    pub balance: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            bin_packing: 0.5,
            affinity: 0.3,
            balance: 0.2,
        }
    }
}

/// Score a single node for one instance of the given workload.
///
/// Returns `None` when the node is infeasible.
pub fn score_node(
    node: &NodeRecord,
    instance: &WorkloadInstance,
    weights: &ScoringWeights,
    cluster_avg_utilization: f64,
) -> Option<NodeScore> {
    if node.draining {
        return None;
    }

    // Hard label constraints.
    for (key, value) in &instance.required_labels {
        match node.labels.get(key) {
            Some(v) if v == value => {}
            _ => return None,
        }
    }

    if !fits(node, instance) {
        return None;
    }

    // Bin-packing score: how full will the node be after placement?
    let projected_memory = node.used_memory_bytes + instance.requests.memory_bytes;
    let bin_packing = if node.capacity_memory_bytes > 0 {
        (projected_memory as f64 / node.capacity_memory_bytes as f64).min(1.0) * 100.0
    } else {
        50.0
    };

    // Affinity score: soft label matching.
    let total_preferred = instance.preferred_labels.len();
    let matched = instance
        .preferred_labels
        .iter()
        .filter(|(k, v)| node.labels.get(*k).is_some_and(|nv| nv == *v))
        .count();
    let affinity = if total_preferred > 0 {
        (matched as f64 / total_preferred as f64) * 100.0
    } else {
        50.0 // Neutral when no preferences.
    };

    // Balance score: penalize nodes far above average utilization.
    let balance = (1.0 - (utilization(node) - cluster_avg_utilization).abs()).max(0.0) * 100.0;

    let score = weights.bin_packing * bin_packing
        + weights.affinity * affinity
        + weights.balance * balance;

    Some(NodeScore {
        node_id: node.id.clone(),
        score,
    })
}

/// Score all nodes and return a sorted list (best first).
pub fn rank_nodes(
    nodes: &[NodeRecord],
    instance: &WorkloadInstance,
    weights: &ScoringWeights,
) -> Vec<NodeScore> {
    let cluster_avg = if nodes.is_empty() {
        0.5
    } else {
        nodes.iter().map(utilization).sum::<f64>() / nodes.len() as f64
    };

    let mut scores: Vec<NodeScore> = nodes
        .iter()
        .filter_map(|n| score_node(n, instance, weights, cluster_avg))
        .collect();

    scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scores
}

/// Whether one instance of the workload fits the node's free resources.
pub fn fits(node: &NodeRecord, instance: &WorkloadInstance) -> bool {
    node.free_memory() >= instance.requests.memory_bytes
        && node.free_cpu() >= instance.requests.cpu_weight
}

/// Resources the node lacks for one instance, in stable order.
///
/// Only meaningful for nodes that pass the label and draining checks;
/// used to build the human-readable infeasibility message.
pub fn missing_resources(node: &NodeRecord, instance: &WorkloadInstance) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if node.free_cpu() < instance.requests.cpu_weight {
        missing.push("cpu");
    }
    if node.free_memory() < instance.requests.memory_bytes {
        missing.push("memory");
    }
    missing
}

fn utilization(node: &NodeRecord) -> f64 {
    if node.capacity_memory_bytes > 0 {
        node.used_memory_bytes as f64 / node.capacity_memory_bytes as f64
    } else {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headroom_state::{InstanceCondition, InstancePhase, ResourceRequests};
    use std::collections::HashMap;

    fn make_node(id: &str, cap_mem: u64, used_mem: u64, cap_cpu: u32, used_cpu: u32) -> NodeRecord {
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

    fn make_instance(mem: u64, cpu: u32) -> WorkloadInstance {
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
    fn draining_node_is_infeasible() {
        let mut node = make_node("n1", 1024, 0, 100, 0);
        node.draining = true;
        let inst = make_instance(128, 10);
        assert!(score_node(&node, &inst, &ScoringWeights::default(), 0.5).is_none());
    }

    #[test]
    fn full_node_is_infeasible() {
        let node = make_node("n1", 1024, 1024, 100, 0);
        let inst = make_instance(128, 10);
        assert!(score_node(&node, &inst, &ScoringWeights::default(), 0.5).is_none());
    }

    #[test]
    fn required_label_mismatch_is_infeasible() {
        let node = make_node("n1", 1024, 0, 100, 0);
        let mut inst = make_instance(128, 10);
        inst.required_labels
            .insert("zone".to_string(), "eu-1".to_string());
        assert!(score_node(&node, &inst, &ScoringWeights::default(), 0.5).is_none());
    }

    #[test]
    fn required_label_match_is_feasible() {
        let mut node = make_node("n1", 1024, 0, 100, 0);
        node.labels.insert("zone".to_string(), "eu-1".to_string());
        let mut inst = make_instance(128, 10);
        inst.required_labels
            .insert("zone".to_string(), "eu-1".to_string());
        assert!(score_node(&node, &inst, &ScoringWeights::default(), 0.5).is_some());
    }

    #[test]
    fn bin_packing_prefers_fuller_node() {
        let nodes = vec![
            make_node("empty", 1024, 0, 100, 0),
            make_node("half-full", 1024, 512, 100, 0),
        ];
        let inst = make_instance(128, 10);

        let ranked = rank_nodes(&nodes, &inst, &ScoringWeights::default());
        assert_eq!(ranked[0].node_id, "half-full");
    }

    #[test]
    fn preferred_labels_break_ties() {
        let mut gpu = make_node("gpu", 1024, 0, 100, 0);
        gpu.labels.insert("accel".to_string(), "gpu".to_string());
        let plain = make_node("plain", 1024, 0, 100, 0);

        let mut inst = make_instance(128, 10);
        inst.preferred_labels
            .insert("accel".to_string(), "gpu".to_string());

        let ranked = rank_nodes(&[plain, gpu], &inst, &ScoringWeights::default());
        assert_eq!(ranked[0].node_id, "gpu");
    }

    #[test]
    fn missing_resources_names_the_shortfall() {
        let node = make_node("n1", 1024, 1000, 100, 95);
        let inst = make_instance(128, 10);
        assert_eq!(missing_resources(&node, &inst), vec!["cpu", "memory"]);

        let node = make_node("n2", 1024, 0, 100, 95);
        assert_eq!(missing_resources(&node, &inst), vec!["cpu"]);
    }

    #[test]
    fn rank_empty_cluster_is_empty() {
        let inst = make_instance(128, 10);
        assert!(rank_nodes(&[], &inst, &ScoringWeights::default()).is_empty());
    }
}
