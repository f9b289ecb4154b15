//! Error types for the storage layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that surface to callers: the database could not be opened, or a
/// transaction could not be started or committed.
#[derive(Debug, Error)]
pub enum DbError {
    /// SQLite could not open (or lock, within the busy timeout) the file.
    #[error("failed to open database at {}: {source}", path.display())]
    Open {
        /// The resolved database path.
        path: PathBuf,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// A connection pragma (busy timeout, WAL, foreign keys) was rejected.
    #[error("failed to configure database connection: {0}")]
    Configure(rusqlite::Error),

    /// `BEGIN` failed.
    #[error("failed to begin transaction: {0}")]
    Begin(rusqlite::Error),

    /// `COMMIT` failed. The transaction was rolled back by SQLite.
    #[error("failed to commit transaction: {0}")]
    Commit(rusqlite::Error),

    /// The schema batch failed.
    #[error("failed to initialize schema: {0}")]
    Schema(rusqlite::Error),

    /// A statement issued inside a scoped transaction failed.
    #[error("database error: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Reasons a sync of the authoritative file back to the root path failed.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No root directory is known for this deployment.
    #[error("root database path is undeterminable")]
    RootUnavailable,

    /// The authoritative file does not exist yet.
    #[error("database file {} does not exist", .0.display())]
    SourceMissing(PathBuf),

    /// The root directory rejected the write check.
    #[error("root directory {} is not writable", .0.display())]
    RootNotWritable(PathBuf),

    /// Stale WAL sidecars next to the root file could not be removed.
    #[error("failed to remove stale sidecar {}: {source}", path.display())]
    Sidecar {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Copying the file over the root file failed.
    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

/// Reasons a backup image could not be produced.
#[derive(Debug, Error)]
pub enum BackupError {
    /// There is no database file to back up.
    #[error("database file {} does not exist", .0.display())]
    Missing(PathBuf),

    /// The file exists but could not be read.
    #[error("failed to read database file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Reasons a restore was rejected. The live database is never modified when
/// one of these is returned.
#[derive(Debug, Error)]
pub enum RestoreError {
    /// The backup payload was empty.
    #[error("backup image is empty")]
    Empty,

    /// The payload does not start with the SQLite file header.
    #[error("backup image is not a SQLite database")]
    NotSqlite,

    /// The target directory could not be created.
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing the staged image failed.
    #[error("failed to stage backup image: {0}")]
    Stage(std::io::Error),

    /// The staged image could not be opened or checked.
    #[error("failed to validate backup image: {0}")]
    Validate(rusqlite::Error),

    /// `PRAGMA integrity_check` reported problems.
    #[error("backup image failed integrity check: {0}")]
    IntegrityCheck(String),

    /// Stale WAL sidecars next to the target could not be removed.
    #[error("failed to remove stale sidecar {}: {source}", path.display())]
    Sidecar {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Renaming the staged image over the target failed.
    #[error("failed to replace {}: {source}", path.display())]
    Replace {
        path: PathBuf,
        source: std::io::Error,
    },
}
