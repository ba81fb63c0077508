// ABOUTME: Configuration for opening the state store.
// ABOUTME: Reads the state directory and lock timeout from environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DKGD_LOCK_TIMEOUT_MS is not a whole number of milliseconds: {0}")]
    InvalidLockTimeout(String),
}

/// Where the state store lives and how it is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub state_dir: PathBuf,
    /// How long opening waits for another holder of the database to let go.
    pub lock_timeout: Duration,
}

impl StoreConfig {
    /// Config for `state_dir` that fails immediately if the database is held.
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            state_dir: state_dir.as_ref().to_path_buf(),
            lock_timeout: Duration::ZERO,
        }
    }

    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - DKGD_STATE_DIR: state directory (default: ~/.dkgd/state)
    /// - DKGD_LOCK_TIMEOUT_MS: wait for a held database at open (default: 0)
    pub fn from_env() -> Result<Self, ConfigError> {
        let state_dir = std::env::var("DKGD_STATE_DIR")
            .ok()
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("/tmp"))
                    .join(".dkgd")
                    .join("state")
            });

        let lock_timeout = match std::env::var("DKGD_LOCK_TIMEOUT_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidLockTimeout(raw))?,
            Err(_) => Duration::ZERO,
        };

        Ok(Self {
            state_dir,
            lock_timeout,
        })
    }
}
