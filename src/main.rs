// ABOUTME: Entry point for the dkgd binary.
// ABOUTME: Initializes tracing, opens the node's state store, and reports what was restored.

use anyhow::Context;
use dkgd_store::{SqliteStateStore, StateError, StateStore, StoreConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dkgd=debug,dkgd_store=debug")),
        )
        .init();

    tracing::info!("dkgd starting up");

    let config = StoreConfig::from_env().context("invalid state store configuration")?;
    let store = SqliteStateStore::open_with_config(&config).with_context(|| {
        format!(
            "failed to open state store at {}",
            config.state_dir.display()
        )
    })?;

    match store.load_offset() {
        Ok(offset) => tracing::info!("resuming event stream at offset {}", offset),
        Err(StateError::OffsetNotSet) => tracing::info!("no saved offset, starting fresh"),
        Err(e) => return Err(e).context("failed to load offset"),
    }

    let pending = store
        .get_operations()
        .context("failed to load pending operations")?;
    tracing::info!("{} pending operations restored", pending.len());

    store.close().context("failed to close state store")?;
    Ok(())
}
