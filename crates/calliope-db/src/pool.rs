//! r2d2-backed SQLite pool for the agent store.
//!
//! The store is a single small table with short transactions, so the
//! pool needs little tuning: WAL journaling keeps persona reads from
//! blocking the write path, and a busy timeout makes concurrent
//! handlers wait for the lock instead of failing with `SQLITE_BUSY`.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::time::Duration;
use thiserror::Error;

/// A pooled SQLite handle shared by the server and the agent store.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Pool sizing and lock-wait tuning, supplied by server config.
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout_ms: u64,

    /// Upper bound on open connections.
    pub max_connections: u32,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            max_connections: 8,
        }
    }
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("could not initialize the agent database pool: {0}")]
    Init(#[from] r2d2::Error),
}

/// Opens `db_path` and builds the connection pool. Tests pass `:memory:`.
///
/// Each connection is switched to WAL as it is opened; a database that
/// ends up in any other journal mode is rejected. In-memory databases
/// report `memory`, which is accepted.
pub fn create_pool(db_path: &str, settings: PoolSettings) -> Result<DbPool, PoolError> {
    let busy_timeout = Duration::from_millis(settings.busy_timeout_ms);

    let manager = SqliteConnectionManager::file(db_path).with_init(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "wal", |row| row.get(0))?;
        if mode == "wal" || mode == "memory" {
            Ok(())
        } else {
            Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("journal_mode is '{}', expected 'wal'", mode)),
            ))
        }
    });

    Ok(Pool::builder()
        .max_size(settings.max_connections)
        .build(manager)?)
}
