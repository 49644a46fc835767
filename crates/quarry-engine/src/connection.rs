//! `Database` — handle factory plus scoped acquisition.
//!
//! Every scope mints its own connection and releases it exactly once on
//! every exit path. A transactional scope maps the body's outcome to
//! commit-vs-rollback before closing. Connections are never shared across
//! concurrent tasks; the factory itself is the only thing that is.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use quarry_core::errors::AccessError;
use quarry_core::types::Params;
use rusqlite::Connection;

use crate::pages::PageStream;
use crate::session::Session;

/// Monotonic id source for named in-memory databases.
static MEMORY_DB_ID: AtomicU64 = AtomicU64::new(0);

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Where handles are minted from.
#[derive(Debug, Clone)]
pub(crate) enum Target {
    File(PathBuf),
    /// Shared-cache URI of a named in-memory database.
    Memory(String),
}

impl Target {
    /// A fresh, process-unique in-memory target. SQLite in-memory databases
    /// are per-connection unless opened through a shared-cache URI.
    pub(crate) fn memory() -> Self {
        let id = MEMORY_DB_ID.fetch_add(1, Ordering::Relaxed);
        Target::Memory(format!("file:quarry-mem-{id}?mode=memory&cache=shared"))
    }
}

/// Handle factory for one logical data source.
#[derive(Debug)]
pub struct Database {
    target: Target,
    busy_timeout: Duration,
    // SQLite drops a shared in-memory database when its last connection
    // closes; this pin keeps it alive between scopes.
    _keeper: Option<Mutex<Connection>>,
}

impl Database {
    /// Open a file-backed database. Fails with a connection error if a
    /// handle cannot be minted, before any scope runs.
    pub fn open(path: &Path) -> Result<Self, AccessError> {
        Self::new(Target::File(path.to_path_buf()), DEFAULT_BUSY_TIMEOUT)
    }

    /// Open a private in-memory database (for testing and scratch work).
    pub fn open_in_memory() -> Result<Self, AccessError> {
        Self::new(Target::memory(), DEFAULT_BUSY_TIMEOUT)
    }

    pub(crate) fn new(target: Target, busy_timeout: Duration) -> Result<Self, AccessError> {
        let mut db = Database {
            target,
            busy_timeout,
            _keeper: None,
        };
        // Probe once so an unreachable source surfaces here, not inside the
        // first scope. For in-memory targets the probe doubles as the pin.
        let probe = db.connect()?;
        match &db.target {
            Target::Memory(_) => db._keeper = Some(Mutex::new(probe)),
            Target::File(_) => close_reporting(probe),
        }
        Ok(db)
    }

    /// Mint one connection. The caller owns it for the lifetime of its scope.
    pub fn connect(&self) -> Result<Connection, AccessError> {
        let conn = match &self.target {
            Target::File(path) => Connection::open(path),
            Target::Memory(uri) => Connection::open(uri),
        }
        .map_err(|e| AccessError::Connection { message: e.to_string() })?;

        conn.busy_timeout(self.busy_timeout)
            .map_err(|e| AccessError::Connection { message: e.to_string() })?;
        if let Target::File(_) = self.target {
            conn.pragma_update(None, "journal_mode", "wal")
                .map_err(|e| AccessError::Connection { message: e.to_string() })?;
            conn.pragma_update(None, "synchronous", "NORMAL")
                .map_err(|e| AccessError::Connection { message: e.to_string() })?;
        }
        Ok(conn)
    }

    /// Run `f` against a scoped connection without transaction policy.
    /// The connection is closed exactly once on every exit path; a close
    /// failure is reported and never masks the body's result.
    pub fn with_session<F, T>(&self, f: F) -> Result<T, AccessError>
    where
        F: FnOnce(&Session<'_>) -> Result<T, AccessError>,
    {
        let conn = self.connect()?;
        let result = f(&Session::new(&conn));
        close_reporting(conn);
        result
    }

    /// Run `f` as one atomic unit of work: commit when the body succeeds,
    /// roll back when it fails, then close. A rollback failure carries the
    /// body's error as its cause so the real failure stays observable.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, AccessError>
    where
        F: FnOnce(&Session<'_>) -> Result<T, AccessError>,
    {
        let conn = self.connect()?;
        if let Err(e) = conn.execute_batch("BEGIN") {
            close_reporting(conn);
            return Err(AccessError::Execution {
                message: format!("begin transaction: {e}"),
            });
        }

        let result = match f(&Session::new(&conn)) {
            Ok(value) => match conn.execute_batch("COMMIT") {
                Ok(()) => Ok(value),
                Err(e) => Err(AccessError::Commit { message: e.to_string() }),
            },
            Err(original) => match conn.execute_batch("ROLLBACK") {
                Ok(()) => Err(original),
                Err(e) => Err(AccessError::Rollback {
                    message: e.to_string(),
                    original: Box::new(original),
                }),
            },
        };

        close_reporting(conn);
        result
    }

    /// Open a page stream over its own connection. The stream scans from
    /// offset 0 and releases its handle when dropped.
    pub fn stream_pages(
        &self,
        statement: &str,
        params: Params,
        page_size: u64,
    ) -> Result<PageStream, AccessError> {
        PageStream::new(self.connect()?, statement, params, page_size)
    }
}

/// Close a connection, reporting (but not propagating) a close failure.
pub(crate) fn close_reporting(conn: Connection) {
    if let Err((_conn, e)) = conn.close() {
        tracing::warn!(error = %e, "connection close failed");
    }
}
