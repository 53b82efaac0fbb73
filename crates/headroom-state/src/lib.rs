//! headroom-state — the synthetic cluster.
//!
//! An in-memory stand-in for a real cluster's object store, pre-seeded with
//! a snapshot of real state before a simulation run begins. Backed by
//! [redb](https://docs.rs/redb) with an in-memory backend; all domain types
//! are JSON-serialized into redb's `&[u8]` value columns.
//!
//! # Architecture
//!
//! Besides plain create/get/update/list operations, the store publishes a
//! [`StoreEvent`] on a broadcast channel after every committed write. The
//! placement engine and the rejection watcher both consume this feed; it is
//! the only push-style surface the simulation core relies on.
//!
//! The `ClusterStore` is `Clone` + `Send` + `Sync` (backed by
//! `Arc<Database>`) and can be shared across async tasks.

pub mod error;
pub mod events;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use events::StoreEvent;
pub use store::ClusterStore;
pub use types::*;
