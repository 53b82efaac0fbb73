//! Change feed published by the store.

use crate::types::{NodeRecord, WorkloadInstance};

/// A record change, broadcast after the corresponding write commits.
///
/// Events carry the post-write state of the record. Subscribers that fall
/// behind the channel capacity observe a `Lagged` error and are expected to
/// re-list from the store.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    InstanceCreated(WorkloadInstance),
    InstanceUpdated(WorkloadInstance),
    NodeUpdated(NodeRecord),
}
