//! The bind interceptor.
//!
//! Injected into the placement engine as its terminal action for a
//! successful placement decision, replacing whatever would commit the
//! decision to real infrastructure. This is the one point where the core
//! observes "this instance *would* be placed here".

use std::sync::Arc;

use headroom_engine::{BindRejection, PlacementAcceptor};

use crate::controller::Controller;
use crate::error::AcceptError;

/// Delegates accepted placements to the controller and translates its
/// failures into the engine's rejection signal. Never retries; the
/// engine's own policy governs what happens to a rejected bind.
pub struct BindInterceptor {
    controller: Arc<Controller>,
}

impl BindInterceptor {
    pub fn new(controller: Arc<Controller>) -> Self {
        Self { controller }
    }
}

impl PlacementAcceptor for BindInterceptor {
    fn accept(&self, instance_key: &str, node_id: &str) -> Result<(), BindRejection> {
        self.controller
            .on_placement_accepted(instance_key, node_id)
            .map_err(|e| match e {
                AcceptError::Lookup(_) => BindRejection::retryable(e.to_string()),
                AcceptError::Projection(_) => BindRejection::fatal(e.to_string()),
            })
    }
}
