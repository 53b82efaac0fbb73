//! headroom-snapshot — synthetic cluster snapshot handling.
//!
//! A snapshot describes the cluster the simulation runs against: its nodes
//! with capacity and usage, plus any workload instances already running on
//! them. Snapshots come from a [`SnapshotSource`] (typically a JSON file
//! exported from the real cluster), pass through an optional content-keyed
//! disk cache, and are loaded into a fresh [`headroom_state::ClusterStore`]
//! by [`sync`].

pub mod cache;
pub mod error;
pub mod snapshot;
pub mod sync;

pub use cache::DiskCache;
pub use error::{SnapshotError, SnapshotResult};
pub use snapshot::{ClusterSnapshot, FileSource, SnapshotSource};
pub use sync::sync;
