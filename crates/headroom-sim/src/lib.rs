//! headroom-sim — the simulation control loop.
//!
//! Estimates how many additional instances of a workload template a cluster
//! can accommodate by driving the placement engine one instance at a time
//! against the synthetic cluster, intercepting each placement decision, and
//! stopping with a definitive reason when the workload no longer fits (or a
//! configured limit is reached).
//!
//! # Architecture
//!
//! ```text
//! Simulation::run()
//!   ├── PlacementEngine task (headroom-engine)
//!   │     └── BindInterceptor ──► Controller::on_placement_accepted
//!   │                                ├── CapacityProjector::apply
//!   │                                └── seed next instance / stop
//!   ├── rejection watcher task (filtered store change feed)
//!   │     └── Controller::on_rejection_observed ──► stop
//!   └── TerminationState (single-fire signal, shared shutdown)
//! ```
//!
//! Placements are trialed strictly one at a time: the cluster's residual
//! capacity after instance *k* is a precondition for evaluating instance
//! *k+1*. The two callback paths (acceptance and rejection) race to stop
//! the same run; termination is a checked state transition, so losing the
//! race is always safe.

pub mod controller;
pub mod error;
pub mod interceptor;
pub mod projector;
pub mod report;
pub mod simulation;
pub mod status;
pub mod termination;
pub mod watcher;

pub use controller::Controller;
pub use error::{AcceptError, SimError};
pub use interceptor::BindInterceptor;
pub use projector::{CapacityProjector, ProjectionError, ResidualCapacityProjector};
pub use report::CapacityReport;
pub use simulation::{Simulation, SimulationConfig, SimulationHandle};
pub use status::RunStatus;
pub use termination::TerminationState;
pub use watcher::{terminal_rejection, watch_rejections};
