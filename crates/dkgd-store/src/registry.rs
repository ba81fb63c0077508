// ABOUTME: Registry of pending operations persisted as one JSON blob under a single key.
// ABOUTME: Every mutation is a locked read-modify-write that rewrites the whole mapping atomically.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use dkgd_core::Operation;

use crate::engine::SqliteEngine;
use crate::error::StateError;

/// Key holding the serialized operations mapping.
pub(crate) const OPERATIONS_KEY: &str = "operations";

/// Operations keyed by ID, as returned by listings.
pub type Operations = BTreeMap<String, Operation>;

/// Serialises access to the operations blob. The whole mapping lives under
/// one key because the engine is only atomic per single-key put; readers
/// therefore see either all of a mutation or none of it.
#[derive(Debug, Default)]
pub(crate) struct OperationRegistry {
    lock: Mutex<()>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write an empty mapping if the key has never been written.
    pub fn seed(&self, engine: &SqliteEngine) -> Result<(), StateError> {
        let _guard = self.guard();
        let empty = encode(&Operations::new())?;
        if engine.put_if_absent(OPERATIONS_KEY, &empty)? {
            tracing::info!("seeded empty operations mapping");
        }
        Ok(())
    }

    /// Insert `operation`. Fails with `OperationExists` and writes nothing if
    /// the ID is already registered.
    pub fn put(&self, engine: &SqliteEngine, operation: &Operation) -> Result<(), StateError> {
        let _guard = self.guard();
        let mut operations = read(engine)?;

        if operations.contains_key(&operation.id) {
            tracing::warn!("rejected duplicate operation {}", operation.id);
            return Err(StateError::OperationExists(operation.id.clone()));
        }

        operations.insert(operation.id.clone(), operation.clone());
        write(engine, &operations)?;

        tracing::debug!(
            "registered operation {} ({} pending)",
            operation.id,
            operations.len()
        );
        Ok(())
    }

    /// Remove the operation with `id`. Removing an unknown ID is not an error.
    pub fn delete(&self, engine: &SqliteEngine, id: &str) -> Result<(), StateError> {
        let _guard = self.guard();
        let mut operations = read(engine)?;

        if operations.remove(id).is_none() {
            tracing::debug!("delete of unknown operation {} ignored", id);
        }
        write(engine, &operations)?;

        Ok(())
    }

    /// Point-in-time copy of every registered operation.
    pub fn list(&self, engine: &SqliteEngine) -> Result<Operations, StateError> {
        let _guard = self.guard();
        read(engine)
    }

    pub fn get(&self, engine: &SqliteEngine, id: &str) -> Result<Operation, StateError> {
        let _guard = self.guard();
        read(engine)?
            .remove(id)
            .ok_or_else(|| StateError::OperationNotFound(id.to_string()))
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read(engine: &SqliteEngine) -> Result<Operations, StateError> {
    let bytes = engine
        .get(OPERATIONS_KEY)?
        .ok_or_else(|| StateError::CorruptValue {
            key: OPERATIONS_KEY,
            reason: "key missing although it is seeded at open".to_string(),
        })?;

    serde_json::from_slice(&bytes).map_err(|source| StateError::Serialization {
        key: OPERATIONS_KEY,
        source,
    })
}

fn write(engine: &SqliteEngine, operations: &Operations) -> Result<(), StateError> {
    engine.put(OPERATIONS_KEY, &encode(operations)?)?;
    Ok(())
}

fn encode(operations: &Operations) -> Result<Vec<u8>, StateError> {
    serde_json::to_vec(operations).map_err(|source| StateError::Serialization {
        key: OPERATIONS_KEY,
        source,
    })
}
