//! Domain types held in the synthetic cluster.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Annotation key marking an instance as generated by a simulation run.
/// The value names the placement engine responsible for the instance.
pub const PROVISIONED_BY_ANNOTATION: &str = "headroom.io/provisioned-by";

/// Per-instance resource requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequests {
    /// Memory requested in bytes.
    pub memory_bytes: u64,
    /// CPU weight requested (relative shares).
    pub cpu_weight: u32,
}

/// The caller-supplied shape of the workload to simulate.
///
/// Immutable for the duration of a run; every trial instance is derived
/// from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadTemplate {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    pub requests: ResourceRequests,
    /// Hard node-label constraints (all must match).
    #[serde(default)]
    pub required_labels: HashMap<String, String>,
    /// Soft node-label preferences (affect scoring only).
    #[serde(default)]
    pub preferred_labels: HashMap<String, String>,
}

fn default_namespace() -> String {
    "default".to_string()
}

/// Lifecycle phase of a workload instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstancePhase {
    #[default]
    Pending,
    Running,
}

/// Status of the placement-eligibility condition.
///
/// `Unknown` means the placement engine has not evaluated the instance yet;
/// `False` means it was evaluated and conclusively could not be placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

/// The placement-eligibility condition of a workload instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceCondition {
    pub status: ConditionStatus,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
}

impl InstanceCondition {
    /// Condition recorded when a placement is accepted.
    pub fn scheduled() -> Self {
        Self {
            status: ConditionStatus::True,
            reason: String::new(),
            message: String::new(),
        }
    }

    /// Terminal condition recorded when an instance cannot be placed.
    pub fn rejected(reason: &str, message: &str) -> Self {
        Self {
            status: ConditionStatus::False,
            reason: reason.to_string(),
            message: message.to_string(),
        }
    }
}

/// A single schedulable unit of work, derived from a [`WorkloadTemplate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadInstance {
    pub name: String,
    pub namespace: String,
    /// Freshly generated unique identifier.
    #[serde(default)]
    pub uid: String,
    /// Name of the placement engine responsible for this instance.
    #[serde(default)]
    pub engine: String,
    pub requests: ResourceRequests,
    #[serde(default)]
    pub required_labels: HashMap<String, String>,
    #[serde(default)]
    pub preferred_labels: HashMap<String, String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    /// Placement target; `None` until the engine accepts a placement.
    #[serde(default)]
    pub node_name: Option<String>,
    #[serde(default)]
    pub phase: InstancePhase,
    #[serde(default)]
    pub scheduled: InstanceCondition,
}

impl WorkloadInstance {
    /// Composite store key.
    pub fn table_key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// Engine named by the simulator provenance annotation, if any.
    pub fn provisioned_by(&self) -> Option<&str> {
        self.annotations
            .get(PROVISIONED_BY_ANNOTATION)
            .map(String::as_str)
    }
}

/// Resource capacity and usage for a cluster node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    pub capacity_memory_bytes: u64,
    pub capacity_cpu_weight: u32,
    #[serde(default)]
    pub used_memory_bytes: u64,
    #[serde(default)]
    pub used_cpu_weight: u32,
    #[serde(default)]
    pub draining: bool,
}

impl NodeRecord {
    pub fn free_memory(&self) -> u64 {
        self.capacity_memory_bytes
            .saturating_sub(self.used_memory_bytes)
    }

    pub fn free_cpu(&self) -> u32 {
        self.capacity_cpu_weight.saturating_sub(self.used_cpu_weight)
    }
}
