//! Error types for inbox operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InboxError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Storage(#[from] starke_db::DbError),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: i64 },

    /// Required fields that were absent or blank, in form order.
    #[error("missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid pagination parameters")]
    InvalidPagination,
}
