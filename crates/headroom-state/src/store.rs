//! ClusterStore — redb-backed synthetic cluster state.
//!
//! Typed CRUD over workload instances and nodes, plus a broadcast change
//! feed. The backend is always in-memory: a run operates on a snapshot of
//! cluster state, never on live infrastructure, and the store is discarded
//! when the run ends. Instances created during a run are never deleted;
//! they remain visible for post-hoc inspection.

use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::events::StoreEvent;
use crate::tables::{INSTANCES, NODES};
use crate::types::{NodeRecord, WorkloadInstance};

/// Buffered events per subscriber before the feed reports lag.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe synthetic cluster store.
#[derive(Clone)]
pub struct ClusterStore {
    db: Arc<Database>,
    events: broadcast::Sender<StoreEvent>,
}

impl ClusterStore {
    /// Create an empty in-memory cluster store.
    pub fn new() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let store = Self {
            db: Arc::new(db),
            events,
        };
        store.ensure_tables()?;
        debug!("synthetic cluster store opened");
        Ok(store)
    }

    /// Subscribe to the change feed.
    ///
    /// Only events published after this call are delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(INSTANCES).map_err(map_err!(Table))?;
        txn.open_table(NODES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Workload instances ─────────────────────────────────────────

    /// Create a workload instance. Fails if the key is already taken.
    pub fn create_instance(&self, instance: &WorkloadInstance) -> StateResult<()> {
        let key = instance.table_key();
        let value = serde_json::to_vec(instance).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(INSTANCES).map_err(map_err!(Table))?;
            if table.get(key.as_str()).map_err(map_err!(Read))?.is_some() {
                return Err(StateError::AlreadyExists(key));
            }
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, "instance created");
        let _ = self.events.send(StoreEvent::InstanceCreated(instance.clone()));
        Ok(())
    }

    /// Get an instance by `{namespace}/{name}` key.
    pub fn get_instance(&self, key: &str) -> StateResult<Option<WorkloadInstance>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(INSTANCES).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let instance: WorkloadInstance =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(instance))
            }
            None => Ok(None),
        }
    }

    /// Update an existing instance. Fails if it does not exist.
    pub fn update_instance(&self, instance: &WorkloadInstance) -> StateResult<()> {
        let key = instance.table_key();
        let value = serde_json::to_vec(instance).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(INSTANCES).map_err(map_err!(Table))?;
            if table.get(key.as_str()).map_err(map_err!(Read))?.is_none() {
                return Err(StateError::NotFound(key));
            }
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, "instance updated");
        let _ = self.events.send(StoreEvent::InstanceUpdated(instance.clone()));
        Ok(())
    }

    /// List all instances.
    pub fn list_instances(&self) -> StateResult<Vec<WorkloadInstance>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(INSTANCES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let instance: WorkloadInstance =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(instance);
        }
        Ok(results)
    }

    // ── Nodes ──────────────────────────────────────────────────────

    /// Insert or update a node record.
    pub fn put_node(&self, node: &NodeRecord) -> StateResult<()> {
        let value = serde_json::to_vec(node).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(NODES).map_err(map_err!(Table))?;
            table
                .insert(node.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        let _ = self.events.send(StoreEvent::NodeUpdated(node.clone()));
        Ok(())
    }

    /// Get a node by ID.
    pub fn get_node(&self, node_id: &str) -> StateResult<Option<NodeRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(NODES).map_err(map_err!(Table))?;
        match table.get(node_id).map_err(map_err!(Read))? {
            Some(guard) => {
                let node: NodeRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(node))
            }
            None => Ok(None),
        }
    }

    /// List all nodes.
    pub fn list_nodes(&self) -> StateResult<Vec<NodeRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(NODES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let node: NodeRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(node);
        }
        Ok(results)
    }
}
