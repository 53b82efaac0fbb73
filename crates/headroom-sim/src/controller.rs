//! The simulation controller.
//!
//! Owns the run's mutable state: the serial counter, the accumulated
//! placements, the stop reason, and the termination flag. Constructed per
//! run; there are no process-wide singletons. The two callbacks, placement
//! acceptance (from the bind interceptor) and rejection observation (from
//! the watcher), run on independent tasks and may race; all shared state is
//! guarded by locks held only for the field mutation, never across a call
//! into the store, the projector, or the engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use headroom_state::{
    ClusterStore, InstanceCondition, InstancePhase, PROVISIONED_BY_ANNOTATION, StateResult,
    WorkloadInstance, WorkloadTemplate,
};

use crate::error::AcceptError;
use crate::projector::CapacityProjector;
use crate::status::RunStatus;
use crate::termination::TerminationState;

use std::sync::Arc;

/// Per-run control state and callbacks.
pub struct Controller {
    store: ClusterStore,
    projector: Arc<dyn CapacityProjector>,
    template: WorkloadTemplate,
    engine_id: String,
    /// Maximum successful placements; 0 means run until rejection.
    limit: usize,
    /// Serial index of the next instance to seed.
    seeded: AtomicUsize,
    status: Mutex<RunStatus>,
    termination: TerminationState,
}

impl Controller {
    pub fn new(
        store: ClusterStore,
        projector: Arc<dyn CapacityProjector>,
        template: WorkloadTemplate,
        engine_id: String,
        limit: usize,
    ) -> Self {
        Self {
            store,
            projector,
            template,
            engine_id,
            limit,
            seeded: AtomicUsize::new(0),
            status: Mutex::new(RunStatus::default()),
            termination: TerminationState::new(),
        }
    }

    pub fn engine_id(&self) -> &str {
        &self.engine_id
    }

    /// Derive and create the next trial instance.
    ///
    /// Exactly one unplaced instance exists at a time: this is called once
    /// before the run's wait and then only from the acceptance callback.
    pub fn seed_next(&self) -> StateResult<WorkloadInstance> {
        let serial = self.seeded.fetch_add(1, Ordering::SeqCst);
        let instance = instantiate(&self.template, &self.engine_id, serial);
        self.store.create_instance(&instance)?;
        debug!(instance = %instance.name, serial, "workload instance seeded");
        Ok(instance)
    }

    /// Placement-acceptance callback, invoked by the bind interceptor.
    ///
    /// Re-reads the instance's current persisted state, applies the target,
    /// marks it running, projects the new cluster state, and records the
    /// placement. Seeds the next instance unless the limit is reached.
    pub fn on_placement_accepted(
        &self,
        instance_key: &str,
        node_id: &str,
    ) -> Result<(), AcceptError> {
        // A bind decision that lost the race against termination.
        if self.termination.begun() {
            return Ok(());
        }

        let current = self
            .store
            .get_instance(instance_key)
            .map_err(|e| AcceptError::Lookup(e.to_string()))?
            .ok_or_else(|| AcceptError::Lookup(format!("instance {instance_key} not found")))?;

        let mut placed = current;
        placed.node_name = Some(node_id.to_string());
        placed.phase = InstancePhase::Running;
        placed.scheduled = InstanceCondition::scheduled();
        self.store
            .update_instance(&placed)
            .map_err(|e| AcceptError::Lookup(e.to_string()))?;

        if let Err(e) = self.projector.apply(&placed) {
            self.stop(format!("ProjectionFailed: {e}"));
            return Err(AcceptError::Projection(e.to_string()));
        }

        let placed_count = {
            let mut status = self.lock_status();
            status.placements.push(placed.clone());
            status.placements.len()
        };
        info!(
            instance = %placed.name,
            node = %node_id,
            total = placed_count,
            "placement recorded"
        );

        if self.limit > 0 && placed_count >= self.limit {
            self.stop(format!(
                "LimitReached: Maximum number of {} simulated",
                self.limit
            ));
            return Ok(());
        }

        // Mid-run seeding failure ends the run with a reason instead of
        // bouncing an error status through the engine forever.
        if let Err(e) = self.seed_next() {
            self.stop(format!("SeedError: {e}"));
        }
        Ok(())
    }

    /// Rejection callback, invoked by the watcher for instances bearing
    /// this run's provenance marker with a terminal condition.
    ///
    /// A no-op once termination has begun: losing the race against the
    /// acceptance-limit path must be safe.
    pub fn on_rejection_observed(&self, instance: &WorkloadInstance, reason: &str, message: &str) {
        if self.termination.begun() {
            return;
        }
        info!(instance = %instance.name, %reason, %message, "terminal rejection observed");
        self.stop(format!("{reason}: {message}"));
    }

    /// Record a stop reason (first writer wins) and terminate.
    pub(crate) fn stop(&self, reason: String) {
        {
            let mut status = self.lock_status();
            if status.stop_reason.is_none() {
                status.stop_reason = Some(reason);
            }
        }
        self.terminate();
    }

    /// Idempotent termination: fires the single-shot signal, which both
    /// unblocks the run's wait and cancels the engine and watcher tasks.
    pub fn terminate(&self) {
        if self.termination.fire() {
            debug!("termination signalled");
        }
    }

    /// Shutdown signal for the run's background tasks.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.termination.subscribe()
    }

    pub async fn wait_terminated(&self) {
        self.termination.wait().await;
    }

    /// Snapshot of the run status.
    pub fn status(&self) -> RunStatus {
        self.lock_status().clone()
    }

    fn lock_status(&self) -> std::sync::MutexGuard<'_, RunStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Build trial instance `serial` from the template.
///
/// The name embeds the serial index, the uid is freshly generated, the
/// placement target is cleared, and the provenance annotation names the
/// engine responsible.
fn instantiate(template: &WorkloadTemplate, engine_id: &str, serial: usize) -> WorkloadInstance {
    let mut annotations = std::collections::HashMap::new();
    annotations.insert(PROVISIONED_BY_ANNOTATION.to_string(), engine_id.to_string());

    WorkloadInstance {
        name: format!("{}-{}", template.name, serial),
        namespace: template.namespace.clone(),
        uid: Uuid::new_v4().to_string(),
        engine: engine_id.to_string(),
        requests: template.requests,
        required_labels: template.required_labels.clone(),
        preferred_labels: template.preferred_labels.clone(),
        annotations,
        node_name: None,
        phase: InstancePhase::Pending,
        scheduled: InstanceCondition::default(),
    }
}
