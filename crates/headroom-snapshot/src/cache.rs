//! Content-keyed disk cache for fetched snapshots.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{SnapshotError, SnapshotResult};

/// Caches raw snapshot bytes on disk, one file per source, so repeated
/// runs against the same source skip the fetch. File names are the sha256
/// of the source id, which keeps arbitrary source ids path-safe.
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: impl AsRef<Path>) -> SnapshotResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(SnapshotError::Cache)?;
        Ok(Self { dir })
    }

    fn entry_path(&self, source_id: &str) -> PathBuf {
        let digest = Sha256::digest(source_id.as_bytes());
        self.dir.join(hex::encode(digest))
    }

    /// Cached bytes for the source, if any.
    pub fn get(&self, source_id: &str) -> SnapshotResult<Option<Vec<u8>>> {
        let path = self.entry_path(source_id);
        match std::fs::read(&path) {
            Ok(bytes) => {
                debug!(path = %path.display(), "snapshot cache hit");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SnapshotError::Cache(e)),
        }
    }

    pub fn set(&self, source_id: &str, bytes: &[u8]) -> SnapshotResult<()> {
        let path = self.entry_path(source_id);
        std::fs::write(&path, bytes).map_err(SnapshotError::Cache)?;
        debug!(path = %path.display(), size = bytes.len(), "snapshot cached");
        Ok(())
    }

    /// Drop the cached entry for the source, if present.
    pub fn clean(&self, source_id: &str) -> SnapshotResult<()> {
        let path = self.entry_path(source_id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SnapshotError::Cache(e)),
        }
    }
}
