//! File-backed set of issued tokens.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenFile {
    #[serde(default)]
    tokens: BTreeSet<String>,
}

/// Issued tokens persisted as `{"tokens": [...]}`.
///
/// A missing or unreadable file reads as an empty set. Writes replace the
/// file through a temp file and rename; the mutex serializes
/// read-modify-write cycles within one process.
#[derive(Debug)]
pub struct TokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, token: &str) -> bool {
        let _guard = self.guard();
        self.load().tokens.contains(token)
    }

    pub fn insert(&self, token: &str) -> Result<(), AuthError> {
        let _guard = self.guard();
        let mut file = self.load();
        if file.tokens.insert(token.to_string()) {
            self.save(&file)?;
        }
        Ok(())
    }

    /// Returns whether the token was present.
    pub fn remove(&self, token: &str) -> Result<bool, AuthError> {
        let _guard = self.guard();
        let mut file = self.load();
        let removed = file.tokens.remove(token);
        if removed {
            self.save(&file)?;
        }
        Ok(removed)
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| {
            tracing::error!("token store lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn load(&self) -> TokenFile {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return TokenFile::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read token store");
                return TokenFile::default();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "token store is not valid JSON, starting empty");
            TokenFile::default()
        })
    }

    fn save(&self, file: &TokenFile) -> Result<(), AuthError> {
        let write_err = |source| AuthError::StoreWrite {
            path: self.path.clone(),
            source,
        };

        let dir = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(write_err)?;

        let json = serde_json::to_vec(file).map_err(|e| write_err(e.into()))?;
        let mut staged = tempfile::Builder::new()
            .prefix(".tokens-")
            .tempfile_in(dir)
            .map_err(write_err)?;
        staged.write_all(&json).map_err(write_err)?;
        staged.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty_and_insert_creates_it() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = TokenStore::new(dir.path().join("nested").join("tokens.json"));

        assert!(!store.contains("abc"));
        store.insert("abc").expect("insert should succeed");
        assert!(store.contains("abc"));

        let raw = std::fs::read_to_string(store.path()).expect("file should exist");
        let json: serde_json::Value = serde_json::from_str(&raw).expect("should be JSON");
        assert_eq!(json, serde_json::json!({ "tokens": ["abc"] }));
    }

    #[test]
    fn remove_reports_presence() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = TokenStore::new(dir.path().join("tokens.json"));
        store.insert("one").expect("insert should succeed");
        store.insert("two").expect("insert should succeed");

        assert!(store.remove("one").expect("remove should succeed"));
        assert!(!store.remove("one").expect("remove should succeed"));
        assert!(!store.contains("one"));
        assert!(store.contains("two"));
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, b"{not json").expect("should write");

        let store = TokenStore::new(&path);
        assert!(!store.contains("anything"));
        store.insert("fresh").expect("insert should overwrite");
        assert!(store.contains("fresh"));
    }
}
