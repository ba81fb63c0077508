// ABOUTME: Slot for the protocol state machine snapshot.
// ABOUTME: Stores a u32 little-endian version followed by the caller's opaque bytes.

use dkgd_core::FsmSnapshot;

use crate::engine::SqliteEngine;
use crate::error::StateError;

/// Key holding the FSM snapshot.
pub(crate) const FSM_KEY: &str = "fsm";

const VERSION_LEN: usize = 4;

/// Overwrite the stored snapshot.
pub(crate) fn save_fsm_snapshot(
    engine: &SqliteEngine,
    snapshot: &FsmSnapshot,
) -> Result<(), StateError> {
    engine.put(FSM_KEY, &encode(snapshot))?;
    Ok(())
}

/// Load the stored snapshot, or None if no snapshot was ever saved.
pub(crate) fn load_fsm_snapshot(
    engine: &SqliteEngine,
) -> Result<Option<FsmSnapshot>, StateError> {
    match engine.get(FSM_KEY)? {
        Some(bytes) => decode(&bytes).map(Some),
        None => Ok(None),
    }
}

fn encode(snapshot: &FsmSnapshot) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(VERSION_LEN + snapshot.data.len());
    bytes.extend_from_slice(&snapshot.version.to_le_bytes());
    bytes.extend_from_slice(&snapshot.data);
    bytes
}

fn decode(bytes: &[u8]) -> Result<FsmSnapshot, StateError> {
    let Some((version, data)) = bytes.split_first_chunk::<VERSION_LEN>() else {
        return Err(StateError::CorruptValue {
            key: FSM_KEY,
            reason: format!(
                "expected at least {} bytes, found {}",
                VERSION_LEN,
                bytes.len()
            ),
        });
    };

    Ok(FsmSnapshot {
        version: u32::from_le_bytes(*version),
        data: data.to_vec(),
    })
}
