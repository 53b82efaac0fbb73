//! The placement-acceptance capability.
//!
//! The engine's terminal action for a successful placement decision is
//! delegated to a [`PlacementAcceptor`] injected at engine construction.
//! In a real cluster this would commit the decision to infrastructure; the
//! simulation core injects an interceptor that records it instead.

use thiserror::Error;

/// Failure signal an acceptor reports back to the engine.
///
/// Retryable rejections fall under the engine's retry policy; fatal ones
/// abandon the instance (the acceptor has already decided what that means
/// for the run as a whole).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct BindRejection {
    pub retryable: bool,
    pub message: String,
}

impl BindRejection {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            retryable: true,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            retryable: false,
            message: message.into(),
        }
    }
}

/// Terminal action for a successful placement decision.
///
/// `instance_key` is the store key of the instance; `node_id` the chosen
/// placement target. Implementations must be callable from the engine's
/// run-loop task.
pub trait PlacementAcceptor: Send + Sync {
    fn accept(&self, instance_key: &str, node_id: &str) -> Result<(), BindRejection>;
}
