//! The unplacement watcher.
//!
//! Subscribed to the synthetic cluster's change feed, filtered to workload
//! instances provisioned by the simulation run. Fires the controller's
//! rejection callback only when an instance's placement-eligibility
//! condition turns conclusively terminal, never for "not yet evaluated".

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{error, warn};

use headroom_state::{ClusterStore, ConditionStatus, StoreEvent, WorkloadInstance};

use crate::controller::Controller;

/// The watcher's filter predicate.
///
/// Returns the terminal rejection `(reason, message)` when the instance
/// carries the provenance marker for `engine_id` and its condition says it
/// was evaluated and found permanently unplaceable. Instances without the
/// marker are ignored even if they share the synthetic cluster.
pub fn terminal_rejection<'a>(
    instance: &'a WorkloadInstance,
    engine_id: &str,
) -> Option<(&'a str, &'a str)> {
    if instance.provisioned_by() != Some(engine_id) {
        return None;
    }
    if instance.scheduled.status != ConditionStatus::False {
        return None;
    }
    if instance.scheduled.reason.is_empty() {
        return None;
    }
    Some((&instance.scheduled.reason, &instance.scheduled.message))
}

/// Watch the change feed until shutdown, forwarding terminal rejections.
///
/// A lagged feed is recovered by re-reading the store: the dropped batch
/// may have carried the in-flight instance's terminal update, and missing
/// it would stall an unbounded run.
pub async fn watch_rejections(
    store: ClusterStore,
    mut events: broadcast::Receiver<StoreEvent>,
    mut shutdown: watch::Receiver<bool>,
    controller: Arc<Controller>,
) {
    loop {
        // A receiver obtained after the signal fired has already seen the
        // value; changed() alone would never resolve.
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            event = events.recv() => match event {
                Ok(StoreEvent::InstanceUpdated(instance)) => {
                    if let Some((reason, message)) =
                        terminal_rejection(&instance, controller.engine_id())
                    {
                        controller.on_rejection_observed(&instance, reason, message);
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "rejection watcher lagged, re-reading the store");
                    recover_from_lag(&store, &controller);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

/// Re-check every stored instance after the feed dropped events.
fn recover_from_lag(store: &ClusterStore, controller: &Controller) {
    let instances = match store.list_instances() {
        Ok(instances) => instances,
        Err(e) => {
            error!(error = %e, "unable to re-list instances after lag");
            return;
        }
    };
    for instance in instances {
        if let Some((reason, message)) = terminal_rejection(&instance, controller.engine_id()) {
            controller.on_rejection_observed(&instance, reason, message);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projector::{CapacityProjector, ProjectionError};
    use headroom_state::{
        InstanceCondition, InstancePhase, PROVISIONED_BY_ANNOTATION, ResourceRequests,
        WorkloadTemplate,
    };
    use std::collections::HashMap;

    fn instance(provenance: Option<&str>, condition: InstanceCondition) -> WorkloadInstance {
        let mut annotations = HashMap::new();
        if let Some(engine) = provenance {
            annotations.insert(PROVISIONED_BY_ANNOTATION.to_string(), engine.to_string());
        }
        WorkloadInstance {
            name: "web-0".to_string(),
            namespace: "default".to_string(),
            uid: String::new(),
            engine: provenance.unwrap_or_default().to_string(),
            requests: ResourceRequests {
                memory_bytes: 128,
                cpu_weight: 10,
            },
            required_labels: HashMap::new(),
            preferred_labels: HashMap::new(),
            annotations,
            node_name: None,
            phase: InstancePhase::Pending,
            scheduled: condition,
        }
    }

    #[test]
    fn fires_for_terminal_condition_with_provenance() {
        let inst = instance(
            Some("default-engine"),
            InstanceCondition::rejected("Unschedulable", "Insufficient cpu"),
        );
        assert_eq!(
            terminal_rejection(&inst, "default-engine"),
            Some(("Unschedulable", "Insufficient cpu"))
        );
    }

    #[test]
    fn ignores_unevaluated_instances() {
        let inst = instance(Some("default-engine"), InstanceCondition::default());
        assert_eq!(terminal_rejection(&inst, "default-engine"), None);
    }

    #[test]
    fn ignores_scheduled_instances() {
        let inst = instance(Some("default-engine"), InstanceCondition::scheduled());
        assert_eq!(terminal_rejection(&inst, "default-engine"), None);
    }

    #[test]
    fn ignores_instances_without_provenance_marker() {
        let inst = instance(
            None,
            InstanceCondition::rejected("Unschedulable", "Insufficient cpu"),
        );
        assert_eq!(terminal_rejection(&inst, "default-engine"), None);
    }

    #[test]
    fn ignores_instances_from_other_engines() {
        let inst = instance(
            Some("another-engine"),
            InstanceCondition::rejected("Unschedulable", "Insufficient cpu"),
        );
        assert_eq!(terminal_rejection(&inst, "default-engine"), None);
    }

    #[test]
    fn ignores_terminal_condition_without_reason() {
        let inst = instance(Some("default-engine"), InstanceCondition::rejected("", ""));
        assert_eq!(terminal_rejection(&inst, "default-engine"), None);
    }

    struct NoopProjector;
    impl CapacityProjector for NoopProjector {
        fn apply(&self, _placed: &WorkloadInstance) -> Result<(), ProjectionError> {
            Ok(())
        }
    }

    fn test_controller(store: &ClusterStore) -> Arc<Controller> {
        Arc::new(Controller::new(
            store.clone(),
            Arc::new(NoopProjector),
            WorkloadTemplate {
                name: "web".to_string(),
                namespace: "default".to_string(),
                requests: ResourceRequests {
                    memory_bytes: 128,
                    cpu_weight: 10,
                },
                required_labels: HashMap::new(),
                preferred_labels: HashMap::new(),
            },
            "default-engine".to_string(),
            0,
        ))
    }

    #[tokio::test]
    async fn lagged_feed_recovers_the_rejection_from_the_store() {
        let store = ClusterStore::new().unwrap();
        let controller = test_controller(&store);

        // The terminal rejection is already persisted, but its update event
        // is about to be dropped from the feed.
        let rejected = instance(
            Some("default-engine"),
            InstanceCondition::rejected("Unschedulable", "Insufficient cpu"),
        );
        store.create_instance(&rejected).unwrap();

        // Capacity-one feed with two queued events: the first recv lags.
        let (tx, rx) = broadcast::channel(1);
        tx.send(StoreEvent::InstanceUpdated(instance(
            None,
            InstanceCondition::default(),
        )))
        .unwrap();
        tx.send(StoreEvent::InstanceUpdated(instance(
            None,
            InstanceCondition::default(),
        )))
        .unwrap();

        let watcher = tokio::spawn(watch_rejections(
            store.clone(),
            rx,
            controller.shutdown_signal(),
            controller.clone(),
        ));

        controller.wait_terminated().await;
        watcher.await.unwrap();
        assert_eq!(
            controller.status().stop_reason.as_deref(),
            Some("Unschedulable: Insufficient cpu")
        );
        drop(tx);
    }
}
