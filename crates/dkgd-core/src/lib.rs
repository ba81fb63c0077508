// ABOUTME: Core library for dkgd, containing the domain types persisted by the state store.
// ABOUTME: Defines pending protocol operations and the opaque FSM snapshot envelope.

pub mod operation;
pub mod snapshot;

pub use operation::Operation;
pub use snapshot::FsmSnapshot;
