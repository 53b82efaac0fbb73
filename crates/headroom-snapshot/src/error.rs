use thiserror::Error;

use headroom_state::StateError;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("unable to read snapshot from {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("snapshot cache error: {0}")]
    Cache(std::io::Error),

    #[error("state store error: {0}")]
    State(#[from] StateError),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;
