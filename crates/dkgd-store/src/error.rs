// ABOUTME: Error taxonomy for the state store.
// ABOUTME: Separates engine failures from expected conditions like a missing offset or operation.

use thiserror::Error;

use crate::engine::EngineError;

/// Errors returned by the state store. `OffsetNotSet`, `OperationNotFound`
/// and `OperationExists` are expected outcomes the caller can act on; the
/// rest mean the store can no longer be trusted for that call.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("offset has never been saved")]
    OffsetNotSet,

    #[error("operation {0} not found")]
    OperationNotFound(String),

    #[error("operation {0} already exists")]
    OperationExists(String),

    #[error("failed to (de)serialize value under key {key}: {source}")]
    Serialization {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("corrupt value under key {key}: {reason}")]
    CorruptValue { key: &'static str, reason: String },
}
