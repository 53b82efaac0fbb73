//! Snapshot model and sources.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use headroom_state::{NodeRecord, WorkloadInstance};

use crate::error::{SnapshotError, SnapshotResult};

/// Point-in-time description of the cluster to simulate against.
///
/// Equality compares parsed content, not serialized bytes, so two exports
/// of the same cluster state compare equal regardless of field order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    /// Workload instances already running in the cluster.
    #[serde(default)]
    pub instances: Vec<WorkloadInstance>,
}

impl ClusterSnapshot {
    pub fn parse(bytes: &[u8]) -> SnapshotResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Where snapshots come from.
pub trait SnapshotSource: Send + Sync {
    /// Stable identity of the source, used as the cache key.
    fn id(&self) -> String;

    /// Fetch the current snapshot bytes from the source of truth.
    fn fetch(&self) -> SnapshotResult<Vec<u8>>;
}

/// Snapshot source backed by a JSON file on disk.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SnapshotSource for FileSource {
    fn id(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> SnapshotResult<Vec<u8>> {
        std::fs::read(&self.path).map_err(|source| SnapshotError::Read {
            path: self.path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_snapshot() {
        let snapshot = ClusterSnapshot::parse(
            br#"{
                "nodes": [
                    {"id": "n1", "capacity_memory_bytes": 1024, "capacity_cpu_weight": 100}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(snapshot.nodes.len(), 1);
        assert_eq!(snapshot.nodes[0].id, "n1");
        assert_eq!(snapshot.nodes[0].used_memory_bytes, 0);
        assert!(snapshot.instances.is_empty());
    }

    #[test]
    fn rejects_malformed_snapshot() {
        assert!(matches!(
            ClusterSnapshot::parse(b"{not json"),
            Err(SnapshotError::Parse(_))
        ));
    }

    #[test]
    fn file_source_reports_missing_file() {
        let source = FileSource::new("/nonexistent/snapshot.json");
        assert!(matches!(source.fetch(), Err(SnapshotError::Read { .. })));
    }

    #[test]
    fn file_source_reads_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        std::fs::write(&path, b"{\"nodes\": []}").unwrap();

        let source = FileSource::new(&path);
        assert_eq!(source.fetch().unwrap(), b"{\"nodes\": []}");
    }
}
