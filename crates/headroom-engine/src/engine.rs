//! The placement engine run loop.
//!
//! A single long-lived task that watches the store's change feed for
//! unplaced instances belonging to this engine, evaluates them strictly in
//! arrival order, and terminates each decision through the acceptor or a
//! terminal condition write.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use headroom_state::{ClusterStore, InstanceCondition, StoreEvent, WorkloadInstance};

use crate::algorithm::{Placement, PlacementAlgorithm};
use crate::bind::PlacementAcceptor;

/// Placement engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Identity of this engine; instances carry it in their `engine` field.
    pub engine_id: String,
    /// Bind attempts per instance before the engine gives up on it.
    pub max_bind_attempts: u32,
    /// Base backoff between bind retries (scaled by attempt count).
    pub retry_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine_id: "default-engine".to_string(),
            max_bind_attempts: 5,
            retry_backoff: Duration::from_millis(10),
        }
    }
}

/// One queued evaluation of an instance.
#[derive(Debug)]
struct BindAttempt {
    instance_key: String,
    attempts: u32,
}

/// The placement engine.
///
/// Subscribes to the change feed at construction, so instances created
/// between construction and [`PlacementEngine::run`] are not missed.
pub struct PlacementEngine {
    config: EngineConfig,
    store: ClusterStore,
    algorithm: Arc<dyn PlacementAlgorithm>,
    acceptor: Arc<dyn PlacementAcceptor>,
    events: broadcast::Receiver<StoreEvent>,
}

impl PlacementEngine {
    pub fn new(
        config: EngineConfig,
        store: ClusterStore,
        algorithm: Arc<dyn PlacementAlgorithm>,
        acceptor: Arc<dyn PlacementAcceptor>,
    ) -> Self {
        let events = store.subscribe();
        Self {
            config,
            store,
            algorithm,
            acceptor,
            events,
        }
    }

    pub fn engine_id(&self) -> &str {
        &self.config.engine_id
    }

    /// Run until the shutdown signal fires or the event feed closes.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(engine = %self.config.engine_id, "placement engine started");
        let mut queue: VecDeque<BindAttempt> = VecDeque::new();

        'outer: loop {
            // A receiver obtained after the signal fired has already seen
            // the value; changed() alone would never resolve.
            if *shutdown.borrow() {
                break;
            }
            while let Some(attempt) = queue.pop_front() {
                if *shutdown.borrow() {
                    break 'outer;
                }
                if attempt.attempts > 0 {
                    tokio::time::sleep(self.config.retry_backoff * attempt.attempts).await;
                }
                self.evaluate(attempt, &mut queue);
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                event = self.events.recv() => match event {
                    Ok(StoreEvent::InstanceCreated(instance)) if self.wants(&instance) => {
                        queue.push_back(BindAttempt {
                            instance_key: instance.table_key(),
                            attempts: 0,
                        });
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event feed lagged, re-listing pending instances");
                        self.requeue_pending(&mut queue);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
        info!(engine = %self.config.engine_id, "placement engine stopped");
    }

    /// Whether an instance is this engine's responsibility and still unplaced.
    fn wants(&self, instance: &WorkloadInstance) -> bool {
        instance.engine == self.config.engine_id && instance.node_name.is_none()
    }

    /// Recover from feed lag by re-listing unplaced instances from the store.
    fn requeue_pending(&self, queue: &mut VecDeque<BindAttempt>) {
        let instances = match self.store.list_instances() {
            Ok(instances) => instances,
            Err(e) => {
                error!(error = %e, "unable to re-list instances after lag");
                return;
            }
        };
        for instance in instances {
            let key = instance.table_key();
            if self.wants(&instance) && !queue.iter().any(|a| a.instance_key == key) {
                queue.push_back(BindAttempt {
                    instance_key: key,
                    attempts: 0,
                });
            }
        }
    }

    fn evaluate(&self, attempt: BindAttempt, queue: &mut VecDeque<BindAttempt>) {
        let instance = match self.store.get_instance(&attempt.instance_key) {
            Ok(Some(instance)) => instance,
            Ok(None) => {
                debug!(key = %attempt.instance_key, "instance vanished before evaluation");
                return;
            }
            Err(e) => {
                error!(key = %attempt.instance_key, error = %e, "unable to read instance");
                return;
            }
        };
        // Stale event for an instance a prior attempt already placed.
        if instance.node_name.is_some() {
            return;
        }

        let nodes = match self.store.list_nodes() {
            Ok(nodes) => nodes,
            Err(e) => {
                error!(error = %e, "unable to list nodes");
                return;
            }
        };

        match self.algorithm.select_node(&instance, &nodes) {
            Placement::Node(node_id) => {
                match self.acceptor.accept(&attempt.instance_key, &node_id) {
                    Ok(()) => {
                        debug!(instance = %instance.name, node = %node_id, "placement accepted");
                    }
                    Err(rejection) if rejection.retryable => {
                        let next_attempt = attempt.attempts + 1;
                        if next_attempt < self.config.max_bind_attempts {
                            debug!(
                                instance = %instance.name,
                                attempt = next_attempt,
                                error = %rejection,
                                "bind rejected, will retry"
                            );
                            queue.push_back(BindAttempt {
                                instance_key: attempt.instance_key,
                                attempts: next_attempt,
                            });
                        } else {
                            warn!(
                                instance = %instance.name,
                                attempts = next_attempt,
                                "bind attempts exhausted, marking instance unplaceable"
                            );
                            self.mark_rejected(instance, "BindFailed", &rejection.message);
                        }
                    }
                    Err(rejection) => {
                        // The acceptor has already decided the run's fate.
                        error!(
                            instance = %instance.name,
                            error = %rejection,
                            "bind rejected fatally, abandoning instance"
                        );
                    }
                }
            }
            Placement::Unfeasible { reason, message } => {
                info!(instance = %instance.name, %reason, %message, "no feasible node");
                self.mark_rejected(instance, &reason, &message);
            }
        }
    }

    /// Record the terminal "could not be placed" condition on an instance.
    fn mark_rejected(&self, mut instance: WorkloadInstance, reason: &str, message: &str) {
        instance.scheduled = InstanceCondition::rejected(reason, message);
        if let Err(e) = self.store.update_instance(&instance) {
            error!(instance = %instance.name, error = %e, "unable to record rejection");
        }
    }
}
