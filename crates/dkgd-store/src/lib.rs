// ABOUTME: Persistence layer for dkgd, the durable local state of a threshold-signing node.
// ABOUTME: Provides the exclusive SQLite engine, offset tracker, operation registry, and FSM slot.

pub mod config;
mod engine;
pub mod error;
mod fsm;
mod offset;
mod registry;
pub mod state;

pub use config::{ConfigError, StoreConfig};
pub use engine::EngineError;
pub use error::StateError;
pub use registry::Operations;
pub use state::{SqliteStateStore, StateStore};
