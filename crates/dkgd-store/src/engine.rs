// ABOUTME: Exclusive on-disk key-value engine backed by a single SQLite table.
// ABOUTME: Provides atomic single-key get/put and holds a process-exclusive lock until closed.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use thiserror::Error;

/// File name of the database inside the state directory.
pub(crate) const DB_FILE_NAME: &str = "state.db";

/// Errors that can occur while opening, reading, or writing the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("state database {} is locked by another opener", .0.display())]
    Locked(PathBuf),
}

/// An ordered key-value store living in `<dir>/state.db`.
///
/// The connection runs in SQLite's exclusive locking mode and takes the
/// exclusive lock while opening, so any other connection to the same file,
/// in this process or another, fails to open until this one is closed.
/// Every `put` is a single autocommit statement and therefore atomic.
pub(crate) struct SqliteEngine {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteEngine {
    /// Open or create the engine inside `dir`, creating the directory if needed.
    /// `lock_timeout` bounds how long to wait for a competing opener to let go.
    pub fn open(dir: &Path, lock_timeout: Duration) -> Result<Self, EngineError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(DB_FILE_NAME);

        let conn = connect(&path, lock_timeout).map_err(|e| classify(e, &path))?;

        tracing::debug!("opened state database at {}", path.display());

        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Path of the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the value stored under `key`, or None if the key was never written.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, EngineError> {
        let value = self
            .conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Overwrite the value stored under `key`.
    pub fn put(&self, key: &str, value: &[u8]) -> Result<(), EngineError> {
        self.conn().execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Write `value` under `key` only if the key is absent.
    /// Returns true if the value was written.
    pub fn put_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, EngineError> {
        let changed = self.conn().execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO NOTHING",
            params![key, value],
        )?;
        Ok(changed > 0)
    }

    /// Close the connection and release the exclusive lock.
    /// Dropping the engine releases it as well, but swallows close errors.
    pub fn close(self) -> Result<(), EngineError> {
        let conn = self.conn.into_inner().unwrap_or_else(PoisonError::into_inner);
        conn.close().map_err(|(_, e)| EngineError::Sqlite(e))?;
        tracing::debug!("closed state database at {}", self.path.display());
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement cannot leave a half-applied write behind.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Open the connection and take the exclusive lock. Any statement here can
/// hit a held database, so the caller classifies every failure.
fn connect(path: &Path, lock_timeout: Duration) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(lock_timeout)?;
    conn.execute_batch("PRAGMA locking_mode=EXCLUSIVE;")?;
    conn.execute_batch("PRAGMA synchronous=FULL;")?;

    // Lock is never released in exclusive mode once taken.
    conn.execute_batch(
        "BEGIN EXCLUSIVE;
         CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value BLOB NOT NULL
         ) WITHOUT ROWID;
         COMMIT;",
    )?;

    Ok(conn)
}

fn classify(err: rusqlite::Error, path: &Path) -> EngineError {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
            EngineError::Locked(path.to_path_buf())
        }
        _ => EngineError::Sqlite(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(dir: &Path) -> SqliteEngine {
        SqliteEngine::open(dir, Duration::ZERO).unwrap()
    }

    #[test]
    fn engine_open_creates_directory_and_file() {
        let dir = TempDir::new().unwrap();
        let state_dir = dir.path().join("deep").join("state");

        let engine = open(&state_dir);

        assert!(state_dir.join(DB_FILE_NAME).exists());
        assert_eq!(engine.path(), state_dir.join(DB_FILE_NAME).as_path());
    }

    #[test]
    fn engine_get_put_overwrite() {
        let dir = TempDir::new().unwrap();
        let engine = open(dir.path());

        assert_eq!(engine.get("missing").unwrap(), None);

        engine.put("k", b"first").unwrap();
        assert_eq!(engine.get("k").unwrap().as_deref(), Some(&b"first"[..]));

        engine.put("k", b"second").unwrap();
        assert_eq!(engine.get("k").unwrap().as_deref(), Some(&b"second"[..]));
    }

    #[test]
    fn engine_stores_empty_values() {
        let dir = TempDir::new().unwrap();
        let engine = open(dir.path());

        engine.put("empty", b"").unwrap();
        assert_eq!(engine.get("empty").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn engine_put_if_absent_keeps_existing_value() {
        let dir = TempDir::new().unwrap();
        let engine = open(dir.path());

        assert!(engine.put_if_absent("k", b"seed").unwrap());
        assert!(!engine.put_if_absent("k", b"other").unwrap());
        assert_eq!(engine.get("k").unwrap().as_deref(), Some(&b"seed"[..]));
    }

    #[test]
    fn engine_rejects_second_opener_until_closed() {
        let dir = TempDir::new().unwrap();
        let engine = open(dir.path());

        let err = SqliteEngine::open(dir.path(), Duration::ZERO)
            .err()
            .expect("second open should fail while the first is held");
        assert!(
            matches!(err, EngineError::Locked(ref p) if p.ends_with(DB_FILE_NAME)),
            "expected Locked, got {:?}",
            err
        );

        engine.close().unwrap();

        let reopened = open(dir.path());
        reopened.put("k", b"v").unwrap();
    }

    #[test]
    fn engine_rejects_second_opener_of_existing_database() {
        let dir = TempDir::new().unwrap();
        let engine = open(dir.path());
        engine.put("offset", &1u64.to_le_bytes()).unwrap();
        engine.close().unwrap();

        let held = open(dir.path());
        assert!(held.get("offset").unwrap().is_some());

        let err = SqliteEngine::open(dir.path(), Duration::ZERO)
            .err()
            .expect("second open of a held, populated database should fail");
        assert!(matches!(err, EngineError::Locked(_)), "expected Locked, got {:?}", err);

        assert_eq!(
            held.get("offset").unwrap(),
            Some(1u64.to_le_bytes().to_vec())
        );
    }

    #[test]
    fn engine_drop_releases_lock() {
        let dir = TempDir::new().unwrap();
        {
            let engine = open(dir.path());
            engine.put("k", b"v").unwrap();
        }

        let engine = open(dir.path());
        assert_eq!(engine.get("k").unwrap().as_deref(), Some(&b"v"[..]));
    }

    #[test]
    fn engine_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let engine = open(dir.path());
        engine.put("offset", &7u64.to_le_bytes()).unwrap();
        engine.close().unwrap();

        let engine = open(dir.path());
        assert_eq!(
            engine.get("offset").unwrap(),
            Some(7u64.to_le_bytes().to_vec())
        );
    }

    #[test]
    fn engine_open_fails_on_garbage_file() {
        let dir = TempDir::new().unwrap();
        let garbage = "this is not a sqlite database\n".repeat(64);
        fs::write(dir.path().join(DB_FILE_NAME), garbage).unwrap();

        let err = SqliteEngine::open(dir.path(), Duration::ZERO)
            .err()
            .expect("garbage file should not open");
        assert!(matches!(err, EngineError::Sqlite(_)), "got {:?}", err);
    }
}
