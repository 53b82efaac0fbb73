//! redb table definitions for the synthetic cluster store.
//!
//! Both tables use `&str` keys and `&[u8]` values (JSON-serialized domain
//! types). Workload instances use composite `{namespace}/{name}` keys.

use redb::TableDefinition;

/// Workload instances keyed by `{namespace}/{name}`.
pub const INSTANCES: TableDefinition<&str, &[u8]> = TableDefinition::new("instances");

/// Cluster nodes keyed by `{node_id}`.
pub const NODES: TableDefinition<&str, &[u8]> = TableDefinition::new("nodes");
