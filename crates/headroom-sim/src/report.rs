//! The capacity report.
//!
//! Condenses a finished run into the numbers an operator cares about: how
//! many instances fit, where they landed, and why the run stopped.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use headroom_state::WorkloadTemplate;

use crate::status::RunStatus;

/// Summary of a completed simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct CapacityReport {
    pub template_name: String,
    pub requested_memory_bytes: u64,
    pub requested_cpu_weight: u32,
    /// The configured placement limit; 0 means unbounded.
    pub limit: usize,
    pub instances_placed: usize,
    /// Placement counts per node, ordered by node id.
    pub placements_per_node: BTreeMap<String, usize>,
    pub stop_reason: String,
}

impl CapacityReport {
    pub fn build(template: &WorkloadTemplate, limit: usize, status: &RunStatus) -> Self {
        let mut placements_per_node = BTreeMap::new();
        for instance in &status.placements {
            if let Some(node) = instance.node_name.as_deref() {
                *placements_per_node.entry(node.to_string()).or_insert(0) += 1;
            }
        }
        Self {
            template_name: template.name.clone(),
            requested_memory_bytes: template.requests.memory_bytes,
            requested_cpu_weight: template.requests.cpu_weight,
            limit,
            instances_placed: status.placements.len(),
            placements_per_node,
            stop_reason: status
                .stop_reason
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

impl fmt::Display for CapacityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "workload: {}", self.template_name)?;
        writeln!(
            f,
            "requests: {} bytes memory, {} cpu weight",
            self.requested_memory_bytes, self.requested_cpu_weight
        )?;
        writeln!(f, "instances placed: {}", self.instances_placed)?;
        writeln!(f, "stop reason: {}", self.stop_reason)?;
        if !self.placements_per_node.is_empty() {
            writeln!(f, "distribution:")?;
            for (node, count) in &self.placements_per_node {
                writeln!(f, "  {node}: {count}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headroom_state::{
        InstanceCondition, InstancePhase, ResourceRequests, WorkloadInstance,
    };
    use std::collections::HashMap;

    fn template() -> WorkloadTemplate {
        WorkloadTemplate {
            name: "web".to_string(),
            namespace: "default".to_string(),
            requests: ResourceRequests {
                memory_bytes: 256,
                cpu_weight: 10,
            },
            required_labels: HashMap::new(),
            preferred_labels: HashMap::new(),
        }
    }

    fn placed(serial: usize, node: &str) -> WorkloadInstance {
        WorkloadInstance {
            name: format!("web-{serial}"),
            namespace: "default".to_string(),
            uid: String::new(),
            engine: "default-engine".to_string(),
            requests: ResourceRequests {
                memory_bytes: 256,
                cpu_weight: 10,
            },
            required_labels: HashMap::new(),
            preferred_labels: HashMap::new(),
            annotations: HashMap::new(),
            node_name: Some(node.to_string()),
            phase: InstancePhase::Running,
            scheduled: InstanceCondition::scheduled(),
        }
    }

    #[test]
    fn build_counts_placements_per_node() {
        let status = RunStatus {
            placements: vec![placed(0, "n1"), placed(1, "n2"), placed(2, "n1")],
            stop_reason: Some("Unschedulable: Insufficient cpu".to_string()),
        };

        let report = CapacityReport::build(&template(), 0, &status);
        assert_eq!(report.instances_placed, 3);
        assert_eq!(report.placements_per_node.get("n1"), Some(&2));
        assert_eq!(report.placements_per_node.get("n2"), Some(&1));
        assert_eq!(report.stop_reason, "Unschedulable: Insufficient cpu");
    }

    #[test]
    fn build_with_empty_run() {
        let status = RunStatus {
            placements: Vec::new(),
            stop_reason: None,
        };

        let report = CapacityReport::build(&template(), 5, &status);
        assert_eq!(report.instances_placed, 0);
        assert!(report.placements_per_node.is_empty());
        assert_eq!(report.stop_reason, "Unknown");
        assert_eq!(report.limit, 5);
    }

    #[test]
    fn display_lists_distribution() {
        let status = RunStatus {
            placements: vec![placed(0, "n1")],
            stop_reason: Some("LimitReached: Maximum number of 1 simulated".to_string()),
        };

        let text = CapacityReport::build(&template(), 1, &status).to_string();
        assert!(text.contains("instances placed: 1"));
        assert!(text.contains("  n1: 1"));
        assert!(text.contains("LimitReached"));
    }

    #[test]
    fn report_serializes_to_json() {
        let status = RunStatus {
            placements: vec![placed(0, "n1")],
            stop_reason: Some("LimitReached: Maximum number of 1 simulated".to_string()),
        };

        let report = CapacityReport::build(&template(), 1, &status);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["instances_placed"], 1);
        assert_eq!(json["placements_per_node"]["n1"], 1);
    }
}
