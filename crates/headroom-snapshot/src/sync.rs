//! Loading a snapshot into the synthetic cluster store.

use tracing::{debug, info};

use headroom_state::ClusterStore;

use crate::cache::DiskCache;
use crate::error::SnapshotResult;
use crate::snapshot::{ClusterSnapshot, SnapshotSource};

/// Load the source's snapshot into the store, going through the cache.
///
/// Without `refresh`, a cached snapshot is used as-is and the source is
/// only contacted on a cache miss. With `refresh`, the source is always
/// fetched and the cache entry is rewritten only when the fetched content
/// actually differs from what was cached.
pub fn sync(
    store: &ClusterStore,
    source: &dyn SnapshotSource,
    cache: &DiskCache,
    refresh: bool,
) -> SnapshotResult<ClusterSnapshot> {
    let source_id = source.id();
    let cached = cache.get(&source_id)?;

    let snapshot = match (&cached, refresh) {
        (Some(bytes), false) => {
            debug!(source = %source_id, "using cached snapshot");
            ClusterSnapshot::parse(bytes)?
        }
        _ => {
            let bytes = source.fetch()?;
            let snapshot = ClusterSnapshot::parse(&bytes)?;
            let unchanged = cached
                .as_deref()
                .map(ClusterSnapshot::parse)
                .transpose()
                .unwrap_or(None)
                .is_some_and(|prev| prev == snapshot);
            if unchanged {
                debug!(source = %source_id, "snapshot unchanged, cache kept");
            } else {
                cache.set(&source_id, &bytes)?;
            }
            snapshot
        }
    };

    fill_store(store, &snapshot)?;
    info!(
        source = %source_id,
        nodes = snapshot.nodes.len(),
        instances = snapshot.instances.len(),
        "cluster snapshot loaded"
    );
    Ok(snapshot)
}

fn fill_store(store: &ClusterStore, snapshot: &ClusterSnapshot) -> SnapshotResult<()> {
    for node in &snapshot.nodes {
        store.put_node(node)?;
    }
    for instance in &snapshot.instances {
        store.create_instance(instance)?;
    }
    Ok(())
}
