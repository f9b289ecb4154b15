//! Candidate locations for the database file.

use std::fmt;
use std::path::{Path, PathBuf};

/// File name used for both the root and scratch candidates.
pub const DEFAULT_FILE_NAME: &str = "database.sqlite3";

/// Where the database may live.
///
/// The root directory is optional: a deployment that cannot determine its
/// own base directory runs from scratch only and never syncs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root_dir: Option<PathBuf>,
    scratch_dir: PathBuf,
    file_name: String,
}

impl StorageLayout {
    pub fn new(root_dir: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: Some(root_dir.into()),
            scratch_dir: scratch_dir.into(),
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }

    /// A layout with no durable location.
    pub fn scratch_only(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: None,
            scratch_dir: scratch_dir.into(),
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn root_dir(&self) -> Option<&Path> {
        self.root_dir.as_deref()
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn root_path(&self) -> Option<PathBuf> {
        self.root_dir.as_ref().map(|dir| dir.join(&self.file_name))
    }

    pub fn scratch_path(&self) -> PathBuf {
        self.scratch_dir.join(&self.file_name)
    }
}

/// Decides whether a directory currently accepts new files.
pub trait WriteCheck: fmt::Debug + Send + Sync {
    fn is_writable(&self, dir: &Path) -> bool;
}

/// Checks by creating (and immediately removing) a temp file in the
/// directory. Permission bits alone are not trusted: read-only mounts and
/// sandboxed filesystems report writable modes they will not honor.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsWriteCheck;

impl WriteCheck for FsWriteCheck {
    fn is_writable(&self, dir: &Path) -> bool {
        match tempfile::Builder::new()
            .prefix(".starke-writable-")
            .tempfile_in(dir)
        {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "directory is not writable");
                false
            }
        }
    }
}
