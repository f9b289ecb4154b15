//! Diagnostic snapshot of the database location and contents.

use serde::Serialize;

use crate::error::DbError;
use crate::locator::{open_connection, StorageLocator};

/// Whether the authoritative file is the durable root copy or the
/// ephemeral scratch copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Durable,
    Ephemeral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub messages: TableCount,
    pub budgets: TableCount,
}

/// Reported by `GET /api/db-admin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStatus {
    pub path: String,
    pub exists: bool,
    pub size: u64,
    pub environment: Environment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<TableCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StorageLocator {
    /// Describes the resolved database. Failures land in `error` instead of
    /// being returned.
    pub fn describe_status(&self) -> StorageStatus {
        let path = self.resolve_path();
        let environment = if path.starts_with(self.layout.scratch_dir()) {
            Environment::Ephemeral
        } else {
            Environment::Durable
        };

        let mut status = StorageStatus {
            path: path.display().to_string(),
            exists: false,
            size: 0,
            environment,
            tables: None,
            error: None,
        };

        match std::fs::metadata(&path) {
            Ok(meta) => {
                status.exists = true;
                status.size = meta.len();
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return status,
            Err(e) => {
                status.error = Some(e.to_string());
                return status;
            }
        }

        match count_rows(self) {
            Ok(tables) => status.tables = Some(tables),
            Err(e) => {
                tracing::warn!(path = %status.path, error = %e, "failed to count table rows");
                status.error = Some(e.to_string());
            }
        }

        status
    }
}

fn count_rows(locator: &StorageLocator) -> Result<TableCounts, DbError> {
    let conn = open_connection(&locator.resolve_path(), locator.settings)?;
    let count = |table: &str| -> Result<TableCount, DbError> {
        let count = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })?;
        Ok(TableCount { count })
    };

    Ok(TableCounts {
        messages: count("messages")?,
        budgets: count("budgets")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::StorageLayout;
    use crate::locator::ConnectionSettings;

    #[test]
    fn status_of_uninitialized_file_reports_error_field() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let locator = StorageLocator::new(
            StorageLayout::scratch_only(dir.path()),
            ConnectionSettings::default(),
        );

        // A file without the schema: counting fails, status still returns.
        drop(locator.acquire_connection().expect("should create file"));

        let status = locator.describe_status();
        assert!(status.exists);
        assert_eq!(status.environment, Environment::Ephemeral);
        assert!(status.tables.is_none());
        let error = status.error.expect("missing table should be reported");
        assert!(error.contains("no such table"), "unexpected error: {error}");
    }

    #[test]
    fn status_serializes_environment_in_lowercase() {
        let status = StorageStatus {
            path: "/srv/app/database.sqlite3".to_string(),
            exists: true,
            size: 4096,
            environment: Environment::Durable,
            tables: Some(TableCounts {
                messages: TableCount { count: 2 },
                budgets: TableCount { count: 0 },
            }),
            error: None,
        };

        let json = serde_json::to_value(&status).expect("should serialize");
        assert_eq!(json["environment"], "durable");
        assert_eq!(json["tables"]["messages"]["count"], 2);
        assert!(json.get("error").is_none());
    }
}
