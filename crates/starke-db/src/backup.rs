//! Full-file backup and validated restore.

use std::io::Write;
use std::path::Path;

use rusqlite::Connection;

use crate::error::{BackupError, RestoreError};
use crate::locator::StorageLocator;
use crate::sync::{checkpoint_wal, remove_if_exists, sidecar_paths};

/// Every SQLite 3 database file starts with this header string.
const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";

impl StorageLocator {
    /// Returns the whole database file, or `None` if it is missing or
    /// unreadable.
    pub fn create_backup(&self) -> Option<Vec<u8>> {
        match self.try_create_backup() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(error = %e, "failed to create database backup");
                None
            }
        }
    }

    /// Typed variant of [`create_backup`](Self::create_backup).
    ///
    /// # Errors
    ///
    /// `BackupError::Missing` when there is no file yet, `BackupError::Read`
    /// when it cannot be read.
    pub fn try_create_backup(&self) -> Result<Vec<u8>, BackupError> {
        let path = self.resolve_path();
        if !path.exists() {
            return Err(BackupError::Missing(path));
        }

        checkpoint_wal(&path);

        std::fs::read(&path).map_err(|source| BackupError::Read { path, source })
    }

    /// Replaces the database with `image`. Returns `true` on success.
    ///
    /// On success the new file is synced to the root (best-effort) and the
    /// cached path is cleared so the next access re-resolves it.
    pub fn restore_from_backup(&self, image: &[u8]) -> bool {
        match self.try_restore_from_backup(image) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to restore database backup");
                false
            }
        }
    }

    /// Typed variant of [`restore_from_backup`](Self::restore_from_backup).
    ///
    /// The image is written to a temp file next to the target and must pass
    /// `PRAGMA integrity_check` before it is renamed over the live file, so
    /// a rejected image leaves the existing database untouched.
    ///
    /// # Errors
    ///
    /// Returns the first failing step as a [`RestoreError`].
    pub fn try_restore_from_backup(&self, image: &[u8]) -> Result<(), RestoreError> {
        if image.is_empty() {
            return Err(RestoreError::Empty);
        }
        if !image.starts_with(SQLITE_HEADER) {
            return Err(RestoreError::NotSqlite);
        }

        let path = self.resolve_path();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(|source| RestoreError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut staged = tempfile::Builder::new()
            .prefix(".starke-restore-")
            .tempfile_in(dir)
            .map_err(RestoreError::Stage)?;
        staged.write_all(image).map_err(RestoreError::Stage)?;
        staged.as_file().sync_all().map_err(RestoreError::Stage)?;

        integrity_check(staged.path())?;

        for sidecar in sidecar_paths(&path) {
            remove_if_exists(&sidecar).map_err(|source| RestoreError::Sidecar {
                path: sidecar.clone(),
                source,
            })?;
        }

        staged.persist(&path).map_err(|e| RestoreError::Replace {
            path: path.clone(),
            source: e.error,
        })?;

        tracing::info!(path = %path.display(), bytes = image.len(), "restored database from backup");

        if !self.synchronize_to_root() {
            tracing::warn!("restored database was not synchronized to root");
        }
        self.clear_cached_path();

        Ok(())
    }
}

/// Runs `PRAGMA integrity_check` on `path`; anything but a single `ok` row
/// is a failure.
fn integrity_check(path: &Path) -> Result<(), RestoreError> {
    let conn = Connection::open(path).map_err(RestoreError::Validate)?;
    let report = {
        let mut stmt = conn
            .prepare("PRAGMA integrity_check;")
            .map_err(RestoreError::Validate)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(RestoreError::Validate)?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(RestoreError::Validate)?
    };

    // Close explicitly so a WAL-mode image checkpoints and drops its
    // sidecars before the rename.
    conn.close().map_err(|(_, e)| RestoreError::Validate(e))?;

    if report.len() == 1 && report[0] == "ok" {
        Ok(())
    } else {
        Err(RestoreError::IntegrityCheck(report.join("; ")))
    }
}
