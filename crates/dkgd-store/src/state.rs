// ABOUTME: The state store contract used by the protocol engine, and its SQLite implementation.
// ABOUTME: Composes the offset tracker, operation registry, and FSM snapshot slot over one engine.

use std::path::Path;

use dkgd_core::{FsmSnapshot, Operation};

use crate::config::StoreConfig;
use crate::engine::SqliteEngine;
use crate::error::StateError;
use crate::fsm::{load_fsm_snapshot, save_fsm_snapshot};
use crate::offset::{load_offset, save_offset};
use crate::registry::{OperationRegistry, Operations};

/// Durable node state: the consumed event-stream offset, pending operations,
/// and the protocol FSM snapshot.
///
/// Operation calls are linearizable with respect to each other. Offset and
/// snapshot calls are not ordered against operation calls, and no two slots
/// are ever written in one transaction.
pub trait StateStore: Send + Sync {
    fn save_offset(&self, offset: u64) -> Result<(), StateError>;
    fn load_offset(&self) -> Result<u64, StateError>;

    fn save_fsm_snapshot(&self, snapshot: &FsmSnapshot) -> Result<(), StateError>;
    fn load_fsm_snapshot(&self) -> Result<Option<FsmSnapshot>, StateError>;

    fn put_operation(&self, operation: &Operation) -> Result<(), StateError>;
    fn delete_operation(&self, operation_id: &str) -> Result<(), StateError>;
    fn get_operations(&self) -> Result<Operations, StateError>;
    fn get_operation_by_id(&self, operation_id: &str) -> Result<Operation, StateError>;
}

/// State store over an exclusively held SQLite database. The database stays
/// locked until `close` is called or the store is dropped.
pub struct SqliteStateStore {
    engine: SqliteEngine,
    operations: OperationRegistry,
}

impl SqliteStateStore {
    /// Open (or create) the store in `state_dir`, failing at once if another
    /// opener holds it.
    pub fn open(state_dir: &Path) -> Result<Self, StateError> {
        Self::open_with_config(&StoreConfig::new(state_dir))
    }

    pub fn open_with_config(config: &StoreConfig) -> Result<Self, StateError> {
        let engine = SqliteEngine::open(&config.state_dir, config.lock_timeout)?;
        let operations = OperationRegistry::new();
        operations.seed(&engine)?;

        tracing::info!("state store open at {}", engine.path().display());

        Ok(Self { engine, operations })
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        self.engine.path()
    }

    /// Release the database so the next opener can take it.
    pub fn close(self) -> Result<(), StateError> {
        tracing::info!("closing state store at {}", self.engine.path().display());
        self.engine.close()?;
        Ok(())
    }
}

impl StateStore for SqliteStateStore {
    fn save_offset(&self, offset: u64) -> Result<(), StateError> {
        save_offset(&self.engine, offset)
    }

    fn load_offset(&self) -> Result<u64, StateError> {
        load_offset(&self.engine)
    }

    fn save_fsm_snapshot(&self, snapshot: &FsmSnapshot) -> Result<(), StateError> {
        save_fsm_snapshot(&self.engine, snapshot)
    }

    fn load_fsm_snapshot(&self) -> Result<Option<FsmSnapshot>, StateError> {
        load_fsm_snapshot(&self.engine)
    }

    fn put_operation(&self, operation: &Operation) -> Result<(), StateError> {
        self.operations.put(&self.engine, operation)
    }

    fn delete_operation(&self, operation_id: &str) -> Result<(), StateError> {
        self.operations.delete(&self.engine, operation_id)
    }

    fn get_operations(&self) -> Result<Operations, StateError> {
        self.operations.list(&self.engine)
    }

    fn get_operation_by_id(&self, operation_id: &str) -> Result<Operation, StateError> {
        self.operations.get(&self.engine, operation_id)
    }
}
