// ABOUTME: Persists the event-stream offset as a fixed-width little-endian integer.
// ABOUTME: One value under one key; each save overwrites the previous one.

use crate::engine::SqliteEngine;
use crate::error::StateError;

/// Key holding the offset.
pub(crate) const OFFSET_KEY: &str = "offset";

/// Overwrite the stored offset.
pub(crate) fn save_offset(engine: &SqliteEngine, offset: u64) -> Result<(), StateError> {
    engine.put(OFFSET_KEY, &offset.to_le_bytes())?;
    Ok(())
}

/// Load the stored offset. Fails with `OffsetNotSet` if nothing was ever saved.
pub(crate) fn load_offset(engine: &SqliteEngine) -> Result<u64, StateError> {
    let bytes = engine.get(OFFSET_KEY)?.ok_or(StateError::OffsetNotSet)?;

    let raw: [u8; 8] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| StateError::CorruptValue {
            key: OFFSET_KEY,
            reason: format!("expected 8 bytes, found {}", bytes.len()),
        })?;

    Ok(u64::from_le_bytes(raw))
}
