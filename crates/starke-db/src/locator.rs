//! Path resolution, connection setup and scoped transactions.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags, Transaction};

use crate::error::DbError;
use crate::layout::{FsWriteCheck, StorageLayout, WriteCheck};
use crate::sync::copy_file_atomic;

/// Runtime tunables for SQLite connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// How long a connection waits on a locked file before failing.
    pub busy_timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(10),
        }
    }
}

/// Whether a scoped transaction copies the database back to the root path
/// after it commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    #[default]
    AfterCommit,
    Skip,
}

/// Resolves and owns the location of the database file.
///
/// The resolved path is computed on first use and cached until a successful
/// restore clears it.
#[derive(Debug)]
pub struct StorageLocator {
    pub(crate) layout: StorageLayout,
    pub(crate) settings: ConnectionSettings,
    pub(crate) write_check: Arc<dyn WriteCheck>,
    resolved: RwLock<Option<PathBuf>>,
}

impl StorageLocator {
    pub fn new(layout: StorageLayout, settings: ConnectionSettings) -> Self {
        Self::with_write_check(layout, settings, Arc::new(FsWriteCheck))
    }

    pub fn with_write_check(
        layout: StorageLayout,
        settings: ConnectionSettings,
        write_check: Arc<dyn WriteCheck>,
    ) -> Self {
        Self {
            layout,
            settings,
            write_check,
            resolved: RwLock::new(None),
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Returns the authoritative database path, resolving it on first call.
    ///
    /// The root file wins when it exists and its directory is writable.
    /// Otherwise the scratch path is used, bootstrapped with a one-time copy
    /// of the root file when the scratch file does not exist yet. A failed
    /// copy is logged and ignored; the schema will be created from empty.
    pub fn resolve_path(&self) -> PathBuf {
        {
            let cached = self.resolved.read().unwrap_or_else(|poisoned| {
                tracing::error!("resolved path lock poisoned, recovering");
                poisoned.into_inner()
            });
            if let Some(path) = cached.as_ref() {
                return path.clone();
            }
        }

        let path = self.select_path();
        let mut cached = self.resolved.write().unwrap_or_else(|poisoned| {
            tracing::error!("resolved path lock poisoned, recovering");
            poisoned.into_inner()
        });
        cached.get_or_insert(path).clone()
    }

    fn select_path(&self) -> PathBuf {
        let scratch = self.layout.scratch_path();
        let root = self.layout.root_path().filter(|p| p.exists());

        let Some(root) = root else {
            tracing::info!(path = %scratch.display(), "no root database, using scratch path");
            self.ensure_scratch_dir();
            return scratch;
        };

        if self.root_dir_writable() {
            tracing::info!(path = %root.display(), "using writable root database");
            return root;
        }

        self.ensure_scratch_dir();
        if !scratch.exists() {
            match copy_file_atomic(&root, &scratch) {
                Ok(bytes) => tracing::info!(
                    root = %root.display(),
                    path = %scratch.display(),
                    bytes,
                    "copied root database to scratch path"
                ),
                Err(e) => tracing::warn!(
                    root = %root.display(),
                    path = %scratch.display(),
                    error = %e,
                    "failed to bootstrap scratch database, starting empty"
                ),
            }
        }

        scratch
    }

    /// Creates the scratch directory if it is missing. A failure surfaces
    /// later as `DbError::Open`.
    fn ensure_scratch_dir(&self) {
        let dir = self.layout.scratch_dir();
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to create scratch directory");
        }
    }

    pub(crate) fn root_dir_writable(&self) -> bool {
        self.layout
            .root_dir()
            .is_some_and(|dir| self.write_check.is_writable(dir))
    }

    pub(crate) fn clear_cached_path(&self) {
        let mut cached = self.resolved.write().unwrap_or_else(|poisoned| {
            tracing::error!("resolved path lock poisoned, recovering");
            poisoned.into_inner()
        });
        *cached = None;
    }

    /// Opens a new connection to the authoritative file.
    ///
    /// The connection waits up to the configured busy timeout on a locked
    /// file and has foreign keys and WAL journaling enabled. The caller owns
    /// it; dropping it closes it.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Open` if SQLite cannot open the file and
    /// `DbError::Configure` if a pragma is rejected.
    pub fn acquire_connection(&self) -> Result<Connection, DbError> {
        let path = self.resolve_path();
        open_connection(&path, self.settings)
    }

    /// Runs `f` inside a transaction and syncs to the root after commit.
    ///
    /// Equivalent to `transaction_with(SyncMode::AfterCommit, f)`.
    pub fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<DbError>,
    {
        self.transaction_with(SyncMode::AfterCommit, f)
    }

    /// Runs `f` inside a transaction on a fresh connection.
    ///
    /// Commits when `f` returns `Ok`, rolls back when it returns `Err` (the
    /// error is returned after the rollback), and closes the connection on
    /// every path. A sync failure after commit is logged and never turns a
    /// committed write into an error.
    pub fn transaction_with<T, E, F>(&self, sync: SyncMode, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<DbError>,
    {
        let mut conn = self.acquire_connection()?;
        let tx = conn.transaction().map_err(DbError::Begin)?;

        let value = match f(&tx) {
            Ok(value) => value,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                return Err(e);
            }
        };

        tx.commit().map_err(DbError::Commit)?;
        // Close before syncing so the last-connection checkpoint folds the
        // WAL into the main file.
        drop(conn);

        if sync == SyncMode::AfterCommit {
            self.synchronize_to_root();
        }

        Ok(value)
    }
}

/// Opens `path` with the standard pragmas applied.
pub(crate) fn open_connection(
    path: &Path,
    settings: ConnectionSettings,
) -> Result<Connection, DbError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    let conn = Connection::open_with_flags(path, flags).map_err(|source| DbError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    conn.busy_timeout(settings.busy_timeout)
        .map_err(DbError::Configure)?;

    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))
        .map_err(DbError::Configure)?;
    if journal_mode != "wal" {
        return Err(DbError::Configure(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!(
                "failed to set WAL journal mode, got: {}",
                journal_mode
            )),
        )));
    }

    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(DbError::Configure)?;

    Ok(conn)
}
