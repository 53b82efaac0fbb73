//! Cluster state projection after an accepted placement.

use thiserror::Error;

use headroom_state::{ClusterStore, StateError, WorkloadInstance};

/// Errors from applying a placement to the synthetic cluster.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("placed instance {0} has no node assignment")]
    NoNode(String),

    #[error("node not found: {0}")]
    NodeMissing(String),

    #[error("state store error: {0}")]
    State(#[from] StateError),
}

/// Recomputes the synthetic cluster's residual capacity after a placement.
///
/// Consumed, not owned, by the controller; the core treats any error as
/// fatal to the run.
pub trait CapacityProjector: Send + Sync {
    fn apply(&self, placed: &WorkloadInstance) -> Result<(), ProjectionError>;
}

/// Default projector: charges the placed instance's requests against its
/// node's used totals, so the next trial sees the reduced capacity.
pub struct ResidualCapacityProjector {
    store: ClusterStore,
}

impl ResidualCapacityProjector {
    pub fn new(store: ClusterStore) -> Self {
        Self { store }
    }
}

impl CapacityProjector for ResidualCapacityProjector {
    fn apply(&self, placed: &WorkloadInstance) -> Result<(), ProjectionError> {
        let node_id = placed
            .node_name
            .as_deref()
            .ok_or_else(|| ProjectionError::NoNode(placed.name.clone()))?;
        let mut node = self
            .store
            .get_node(node_id)?
            .ok_or_else(|| ProjectionError::NodeMissing(node_id.to_string()))?;

        node.used_memory_bytes = node
            .used_memory_bytes
            .saturating_add(placed.requests.memory_bytes);
        node.used_cpu_weight = node
            .used_cpu_weight
            .saturating_add(placed.requests.cpu_weight);
        self.store.put_node(&node)?;
        Ok(())
    }
}
