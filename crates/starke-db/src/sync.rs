//! Best-effort copy of the authoritative database back to the root path.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};

use crate::error::SyncError;
use crate::locator::StorageLocator;

/// What a successful sync did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The authoritative file already is the root file.
    AlreadyDurable,
    /// The file was copied over the root file.
    Copied { bytes: u64 },
}

impl StorageLocator {
    /// Copies the authoritative file over the root file.
    ///
    /// Never fails loudly: every error is logged and reported as `false` so
    /// that a committed write is never undone by a durability problem.
    pub fn synchronize_to_root(&self) -> bool {
        match self.try_synchronize_to_root() {
            Ok(SyncOutcome::AlreadyDurable) => true,
            Ok(SyncOutcome::Copied { bytes }) => {
                tracing::debug!(bytes, "synchronized database to root");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to synchronize database to root");
                false
            }
        }
    }

    /// Typed variant of [`synchronize_to_root`](Self::synchronize_to_root).
    ///
    /// # Errors
    ///
    /// Fails fast with `RootUnavailable`, `SourceMissing` or
    /// `RootNotWritable` before touching the filesystem; `Sidecar` or `Copy`
    /// if the copy itself fails.
    pub fn try_synchronize_to_root(&self) -> Result<SyncOutcome, SyncError> {
        let current = self.resolve_path();
        let root = self.layout.root_path().ok_or(SyncError::RootUnavailable)?;

        if current == root {
            return Ok(SyncOutcome::AlreadyDurable);
        }
        if !current.exists() {
            return Err(SyncError::SourceMissing(current));
        }
        if !self.root_dir_writable() {
            let dir = root.parent().map(Path::to_path_buf).unwrap_or_default();
            return Err(SyncError::RootNotWritable(dir));
        }

        checkpoint_wal(&current);

        for sidecar in sidecar_paths(&root) {
            remove_if_exists(&sidecar).map_err(|source| SyncError::Sidecar {
                path: sidecar.clone(),
                source,
            })?;
        }

        let bytes = copy_file_atomic(&current, &root).map_err(|source| SyncError::Copy {
            from: current.clone(),
            to: root.clone(),
            source,
        })?;

        Ok(SyncOutcome::Copied { bytes })
    }
}

/// Folds the WAL of `path` into the main file so a byte copy of the main
/// file is complete. Failures only mean the copy may lag behind.
pub(crate) fn checkpoint_wal(path: &Path) {
    let result = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
        .and_then(|conn| conn.query_row("PRAGMA wal_checkpoint(TRUNCATE);", [], |_| Ok(())));
    if let Err(e) = result {
        tracing::debug!(path = %path.display(), error = %e, "wal checkpoint skipped");
    }
}

/// The `-wal` and `-shm` files SQLite keeps next to a WAL-mode database.
pub(crate) fn sidecar_paths(db_path: &Path) -> [PathBuf; 2] {
    ["-wal", "-shm"].map(|suffix| {
        let mut name = db_path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    })
}

pub(crate) fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Copies `from` over `to` through a temp file in the destination directory
/// and an atomic rename, carrying over permissions and modification time.
/// Readers of `to` see either the old or the new file, never a partial one.
pub(crate) fn copy_file_atomic(from: &Path, to: &Path) -> io::Result<u64> {
    let dir = to
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent"))?;

    let mut source = File::open(from)?;
    let metadata = source.metadata()?;

    let mut staged = tempfile::Builder::new()
        .prefix(".starke-sync-")
        .tempfile_in(dir)?;
    let bytes = io::copy(&mut source, staged.as_file_mut())?;
    staged.as_file().sync_all()?;

    staged.as_file().set_permissions(metadata.permissions())?;
    if let Ok(modified) = metadata.modified() {
        if let Err(e) = staged.as_file().set_modified(modified) {
            tracing::debug!(path = %to.display(), error = %e, "could not preserve mtime");
        }
    }

    staged.persist(to).map_err(|e| e.error)?;
    Ok(bytes)
}
