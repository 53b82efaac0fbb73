//! Simulation error types.

use thiserror::Error;

use headroom_state::StateError;

/// Errors crossing the [`Simulation::run`](crate::Simulation::run) boundary.
///
/// Only a failure to seed the very first instance surfaces as an error;
/// every other outcome is recorded as a stop reason in the final
/// [`RunStatus`](crate::RunStatus).
#[derive(Debug, Error)]
pub enum SimError {
    #[error("unable to create initial workload instance: {0}")]
    Seed(#[from] StateError),
}

/// Failure inside the placement-acceptance callback, reported back to the
/// engine through the bind interceptor.
#[derive(Debug, Error)]
pub enum AcceptError {
    /// The instance could not be re-read or persisted; recoverable, the
    /// engine's retry policy applies.
    #[error("unable to bind: {0}")]
    Lookup(String),

    /// The capacity projector rejected the placement; fatal, the run has
    /// already been stopped.
    #[error("unable to recompute cluster state: {0}")]
    Projection(String),
}
