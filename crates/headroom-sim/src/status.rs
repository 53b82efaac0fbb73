//! Accumulated run outcome.

use serde::Serialize;

use headroom_state::WorkloadInstance;

/// All successfully placed instances plus the reason the run stopped.
///
/// Owned by the [`Controller`](crate::Controller) and mutated under lock:
/// placements are appended from the bind interceptor's task, the stop
/// reason is written exactly once at termination, and the report builder
/// reads the whole thing afterwards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStatus {
    /// Placed instances in acceptance order.
    pub placements: Vec<WorkloadInstance>,
    /// `None` while the run is active; set exactly once at termination.
    pub stop_reason: Option<String>,
}
