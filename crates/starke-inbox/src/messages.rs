//! Contact-form messages.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::InboxError;
use crate::page::{Page, PageRequest};
use crate::{clean, now_timestamp, update_columns};

/// A stored contact message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    /// RFC 3339 UTC timestamp.
    pub created_at: String,
}

/// A message as submitted by the public form, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// A validated, trimmed message ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl MessageDraft {
    /// Trims every field and checks that all of them are present.
    ///
    /// # Errors
    ///
    /// `InboxError::MissingFields` lists every absent or blank field.
    pub fn into_new(self) -> Result<NewMessage, InboxError> {
        let name = clean(self.name);
        let email = clean(self.email);
        let subject = clean(self.subject);
        let message = clean(self.message);

        match (name, email, subject, message) {
            (Some(name), Some(email), Some(subject), Some(message)) => Ok(NewMessage {
                name,
                email,
                subject,
                message,
            }),
            (name, email, subject, message) => {
                let missing = [
                    ("name", name.is_none()),
                    ("email", email.is_none()),
                    ("subject", subject.is_none()),
                    ("message", message.is_none()),
                ]
                .into_iter()
                .filter_map(|(field, absent)| absent.then_some(field))
                .collect();
                Err(InboxError::MissingFields(missing))
            }
        }
    }
}

/// Fields an admin may change. `None` leaves the column as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

impl MessageUpdate {
    fn columns(self) -> Result<Vec<(&'static str, String)>, InboxError> {
        let mut columns = Vec::new();
        let mut blank = Vec::new();
        for (column, value) in [
            ("name", self.name),
            ("email", self.email),
            ("subject", self.subject),
            ("message", self.message),
        ] {
            if let Some(value) = value {
                match clean(Some(value)) {
                    Some(value) => columns.push((column, value)),
                    None => blank.push(column),
                }
            }
        }
        if blank.is_empty() {
            Ok(columns)
        } else {
            Err(InboxError::MissingFields(blank))
        }
    }
}

/// Stores a new message and returns its id.
pub fn create_message(conn: &Connection, message: &NewMessage) -> Result<i64, InboxError> {
    conn.execute(
        "INSERT INTO messages (name, email, subject, message, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            message.name,
            message.email,
            message.subject,
            message.message,
            now_timestamp(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(id, "stored contact message");
    Ok(id)
}

pub fn get_message(conn: &Connection, id: i64) -> Result<Message, InboxError> {
    conn.query_row(
        "SELECT id, name, email, subject, message, created_at
         FROM messages WHERE id = ?1",
        [id],
        map_row_to_message,
    )
    .optional()?
    .ok_or(InboxError::NotFound {
        kind: "message",
        id,
    })
}

/// Lists messages newest first.
pub fn list_messages(conn: &Connection, page: PageRequest) -> Result<Page<Message>, InboxError> {
    let total: i64 = conn.query_row("SELECT COUNT(1) FROM messages", [], |row| row.get(0))?;

    let mut stmt = conn.prepare(
        "SELECT id, name, email, subject, message, created_at
         FROM messages
         ORDER BY datetime(created_at) DESC, id DESC
         LIMIT ?1 OFFSET ?2",
    )?;
    let rows = stmt.query_map(
        params![page.page_size(), page.offset()],
        map_row_to_message,
    )?;
    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }

    Ok(Page {
        items,
        total,
        page: page.page(),
        page_size: page.page_size(),
    })
}

/// Applies a partial update and returns the updated message.
pub fn update_message(
    conn: &Connection,
    id: i64,
    update: MessageUpdate,
) -> Result<Message, InboxError> {
    let columns = update.columns()?;
    if !columns.is_empty() && update_columns(conn, "messages", id, &columns)? == 0 {
        return Err(InboxError::NotFound {
            kind: "message",
            id,
        });
    }
    get_message(conn, id)
}

pub fn delete_message(conn: &Connection, id: i64) -> Result<(), InboxError> {
    let deleted = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(InboxError::NotFound {
            kind: "message",
            id,
        });
    }
    Ok(())
}

fn map_row_to_message(row: &Row) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        subject: row.get("subject")?,
        message: row.get("message")?,
        created_at: row.get("created_at")?,
    })
}
