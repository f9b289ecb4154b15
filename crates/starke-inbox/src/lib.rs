//! Contact inbox for the Starke website.
//!
//! Two record kinds arrive from public forms: **messages** (general contact)
//! and **budgets** (quote requests). This crate validates the submitted
//! drafts, stores them, and serves paginated, newest-first listings plus
//! single-record reads, partial updates and deletes for the admin panel.
//!
//! All functions take a plain `rusqlite::Connection`; writers are expected
//! to pass the transaction handed out by
//! [`starke_db::StorageLocator::transaction`] so the write is synced to the
//! durable copy after commit.

mod budgets;
mod error;
mod messages;
mod page;

pub use budgets::{
    create_budget, delete_budget, get_budget, list_budgets, update_budget, Budget, BudgetDraft,
    BudgetUpdate, NewBudget,
};
pub use error::InboxError;
pub use messages::{
    create_message, delete_message, get_message, list_messages, update_message, Message,
    MessageDraft, MessageUpdate, NewMessage,
};
pub use page::{Page, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Current time as stored in `created_at` columns.
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Trims a submitted field, treating blank input as absent.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Applies `UPDATE <table> SET col = ? ... WHERE id = ?` for the given
/// columns and returns the number of rows changed. Column names come from
/// the callers' static field lists, never from input.
pub(crate) fn update_columns(
    conn: &rusqlite::Connection,
    table: &str,
    id: i64,
    columns: &[(&'static str, String)],
) -> rusqlite::Result<usize> {
    let assignments = columns
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {table} SET {assignments} WHERE id = ?{}",
        columns.len() + 1
    );

    let mut values: Vec<&dyn rusqlite::ToSql> = columns
        .iter()
        .map(|(_, value)| value as &dyn rusqlite::ToSql)
        .collect();
    values.push(&id);

    conn.execute(&sql, values.as_slice())
}
