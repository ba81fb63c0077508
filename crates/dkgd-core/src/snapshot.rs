// ABOUTME: Opaque, versioned snapshot of the protocol state machine.
// ABOUTME: The store keeps the bytes as-is; only the protocol layer interprets them.

/// A point-in-time checkpoint of the protocol FSM. `version` lets the caller
/// evolve its own encoding of `data` without the store knowing about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsmSnapshot {
    pub version: u32,
    pub data: Vec<u8>,
}

impl FsmSnapshot {
    pub fn new(version: u32, data: Vec<u8>) -> Self {
        Self { version, data }
    }
}
