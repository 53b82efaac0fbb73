//! Run orchestration.
//!
//! Wires the controller, bind interceptor, placement engine, and rejection
//! watcher into a single run, then drives it to completion.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use headroom_engine::{
    BinPackingAlgorithm, EngineConfig, PlacementAlgorithm, PlacementEngine,
};
use headroom_state::{ClusterStore, WorkloadTemplate};

use crate::controller::Controller;
use crate::error::SimError;
use crate::interceptor::BindInterceptor;
use crate::projector::{CapacityProjector, ResidualCapacityProjector};
use crate::status::RunStatus;
use crate::watcher::watch_rejections;

/// Simulation run configuration.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub template: WorkloadTemplate,
    /// Maximum successful placements; 0 means run until rejection.
    pub limit: usize,
    pub engine: EngineConfig,
    /// Delay before seeding instance #0, giving the freshly started engine
    /// and watcher tasks time to settle on the change feed.
    pub warmup: Duration,
}

impl SimulationConfig {
    pub fn new(template: WorkloadTemplate, limit: usize) -> Self {
        Self {
            template,
            limit,
            engine: EngineConfig::default(),
            warmup: Duration::from_millis(20),
        }
    }
}

/// A fully wired simulation, ready to run once.
pub struct Simulation {
    store: ClusterStore,
    controller: Arc<Controller>,
    engine: PlacementEngine,
    warmup: Duration,
}

impl Simulation {
    /// Build a simulation with the default bin-packing algorithm and the
    /// residual-capacity projector.
    pub fn new(store: ClusterStore, config: SimulationConfig) -> Self {
        let projector = Arc::new(ResidualCapacityProjector::new(store.clone()));
        Self::with_parts(
            store,
            config,
            Arc::new(BinPackingAlgorithm::default()),
            projector,
        )
    }

    /// Build a simulation with a caller-supplied algorithm and projector.
    pub fn with_parts(
        store: ClusterStore,
        config: SimulationConfig,
        algorithm: Arc<dyn PlacementAlgorithm>,
        projector: Arc<dyn CapacityProjector>,
    ) -> Self {
        let controller = Arc::new(Controller::new(
            store.clone(),
            projector,
            config.template,
            config.engine.engine_id.clone(),
            config.limit,
        ));
        let interceptor = Arc::new(BindInterceptor::new(controller.clone()));
        let engine = PlacementEngine::new(config.engine, store.clone(), algorithm, interceptor);
        Self {
            store,
            controller,
            engine,
            warmup: config.warmup,
        }
    }

    /// Handle for aborting the run from outside (e.g. on process shutdown).
    pub fn handle(&self) -> SimulationHandle {
        SimulationHandle {
            controller: self.controller.clone(),
        }
    }

    /// Run the simulation to completion.
    ///
    /// Starts the engine and watcher as background tasks, seeds instance
    /// #0, and blocks until termination is signalled. Both tasks are
    /// joined before returning, successfully or not; nothing keeps running
    /// after this resolves.
    pub async fn run(self) -> Result<RunStatus, SimError> {
        let controller = self.controller;
        let watcher_task: JoinHandle<()> = tokio::spawn(watch_rejections(
            self.store.clone(),
            self.store.subscribe(),
            controller.shutdown_signal(),
            controller.clone(),
        ));
        let engine_task: JoinHandle<()> =
            tokio::spawn(self.engine.run(controller.shutdown_signal()));

        tokio::time::sleep(self.warmup).await;

        if let Err(e) = controller.seed_next() {
            error!(error = %e, "unable to seed initial instance");
            controller.terminate();
            join(engine_task, watcher_task).await;
            return Err(SimError::Seed(e));
        }

        controller.wait_terminated().await;
        join(engine_task, watcher_task).await;
        debug!("simulation run complete");
        Ok(controller.status())
    }
}

async fn join(engine_task: JoinHandle<()>, watcher_task: JoinHandle<()>) {
    if let Err(e) = engine_task.await {
        error!(error = %e, "engine task failed");
    }
    if let Err(e) = watcher_task.await {
        error!(error = %e, "watcher task failed");
    }
}

/// Idempotent external shutdown for a running simulation.
#[derive(Clone)]
pub struct SimulationHandle {
    controller: Arc<Controller>,
}

impl SimulationHandle {
    /// Abort the run. Safe to call repeatedly and from any task; does
    /// nothing if the run has already stopped.
    pub fn close(&self) {
        self.controller.stop("Aborted: closed by caller".to_string());
    }
}
