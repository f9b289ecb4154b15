//! Storage layer for the Starke contact backend.
//!
//! Owns the single SQLite file that holds contact messages and budget
//! requests, and decides where that file lives. Two candidate locations
//! exist:
//!
//! - the **root** path, next to the deployed application, which is durable
//!   when it is writable;
//! - the **scratch** path, under an ephemeral directory that is always
//!   writable but may vanish between invocations.
//!
//! A [`StorageLocator`] resolves the authoritative path once, bootstraps the
//! scratch copy from the root file when needed, and copies the scratch file
//! back to the root after every committed write.
//!
//! # Design decisions
//!
//! - **Explicit locator instance**: the resolved path is cached inside the
//!   locator rather than in a global, so tests can simulate several
//!   environments in one process.
//! - **Best-effort durability**: sync, backup and restore report typed
//!   errors through their `try_*` variants and collapse them to
//!   `bool`/`Option` at the public boundary. Only connection and write
//!   failures propagate to callers.
//! - **Validate before replace**: restores stage the incoming image in a
//!   temp file and run `PRAGMA integrity_check` on it before it replaces the
//!   live database.

mod backup;
mod error;
mod layout;
mod locator;
mod schema;
mod status;
mod sync;

pub use error::{BackupError, DbError, RestoreError, SyncError};
pub use layout::{FsWriteCheck, StorageLayout, WriteCheck, DEFAULT_FILE_NAME};
pub use locator::{ConnectionSettings, StorageLocator, SyncMode};
pub use schema::SCHEMA_SQL;
pub use status::{Environment, StorageStatus, TableCount, TableCounts};
pub use sync::SyncOutcome;
