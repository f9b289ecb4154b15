//! Table definitions for the contact inbox.
//!
//! There is no migration history: the schema is a single idempotent batch
//! embedded at compile time and applied with `CREATE ... IF NOT EXISTS`.

use crate::error::DbError;
use crate::locator::StorageLocator;

/// The `messages` and `budgets` tables and their `created_at` indexes.
pub const SCHEMA_SQL: &str = include_str!("sql/schema.sql");

impl StorageLocator {
    /// Creates the tables if they are missing. Safe to call repeatedly.
    ///
    /// Runs in a scoped transaction, so a successful commit also syncs the
    /// file to the root path.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the database cannot be opened or the batch fails.
    pub fn initialize_schema(&self) -> Result<(), DbError> {
        self.transaction(|tx| tx.execute_batch(SCHEMA_SQL).map_err(DbError::Schema))?;
        tracing::debug!("database schema initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::StorageLayout;
    use crate::locator::ConnectionSettings;

    fn table_names(locator: &StorageLocator) -> Vec<String> {
        let conn = locator.acquire_connection().expect("should open");
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )
            .expect("failed to prepare table query");
        let names = stmt
            .query_map([], |row| row.get(0))
            .expect("failed to execute table query");
        names
            .collect::<Result<Vec<String>, _>>()
            .expect("failed to read table name")
    }

    #[test]
    fn initialize_schema_is_idempotent_and_keeps_rows() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let locator = StorageLocator::new(
            StorageLayout::scratch_only(dir.path()),
            ConnectionSettings::default(),
        );

        locator.initialize_schema().expect("first init should succeed");
        {
            let conn = locator.acquire_connection().expect("should open");
            conn.execute(
                "INSERT INTO messages (name, email, subject, message, created_at)
                 VALUES ('Ana', 'ana@example.com', 'Hi', 'Hello', '2025-01-01T00:00:00Z')",
                [],
            )
            .expect("should insert message");
        }

        for _ in 0..3 {
            locator.initialize_schema().expect("re-init should succeed");
        }

        assert_eq!(table_names(&locator), vec!["budgets", "messages"]);

        let conn = locator.acquire_connection().expect("should open");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .expect("should count messages");
        assert_eq!(count, 1, "re-initialization must not drop rows");

        let indexes: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'index' AND name IN ('idx_messages_created_at', 'idx_budgets_created_at')",
                [],
                |row| row.get(0),
            )
            .expect("should count indexes");
        assert_eq!(indexes, 2);
    }
}
