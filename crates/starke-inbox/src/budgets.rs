//! Budget (quote) requests.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::InboxError;
use crate::page::{Page, PageRequest};
use crate::{clean, now_timestamp, update_columns};

/// A stored budget request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service: String,
    pub details: String,
    pub company: Option<String>,
    pub city: String,
    pub created_at: String,
}

/// A budget request as submitted by the public form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub details: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
}

/// A validated budget request. `company` is empty when not given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBudget {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service: String,
    pub details: String,
    pub company: String,
    pub city: String,
}

impl BudgetDraft {
    /// # Errors
    ///
    /// `InboxError::MissingFields` lists every absent or blank required
    /// field (everything except `company`).
    pub fn into_new(self) -> Result<NewBudget, InboxError> {
        let required = [
            ("name", clean(self.name)),
            ("email", clean(self.email)),
            ("phone", clean(self.phone)),
            ("service", clean(self.service)),
            ("details", clean(self.details)),
            ("city", clean(self.city)),
        ];

        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(field, _)| *field)
            .collect();
        if !missing.is_empty() {
            return Err(InboxError::MissingFields(missing));
        }

        let [name, email, phone, service, details, city] =
            required.map(|(_, value)| value.unwrap_or_default());

        Ok(NewBudget {
            name,
            email,
            phone,
            service,
            details,
            company: clean(self.company).unwrap_or_default(),
            city,
        })
    }
}

/// Fields an admin may change. `company` may be cleared with an empty
/// string; the other fields must stay non-blank.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub details: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
}

impl BudgetUpdate {
    fn columns(self) -> Result<Vec<(&'static str, String)>, InboxError> {
        let mut columns = Vec::new();
        let mut blank = Vec::new();
        for (column, value) in [
            ("name", self.name),
            ("email", self.email),
            ("phone", self.phone),
            ("service", self.service),
            ("details", self.details),
            ("city", self.city),
        ] {
            if let Some(value) = value {
                match clean(Some(value)) {
                    Some(value) => columns.push((column, value)),
                    None => blank.push(column),
                }
            }
        }
        if !blank.is_empty() {
            return Err(InboxError::MissingFields(blank));
        }
        if let Some(company) = self.company {
            columns.push(("company", company.trim().to_string()));
        }
        Ok(columns)
    }
}

/// Stores a new budget request and returns its id.
pub fn create_budget(conn: &Connection, budget: &NewBudget) -> Result<i64, InboxError> {
    conn.execute(
        "INSERT INTO budgets (name, email, phone, service, details, company, city, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            budget.name,
            budget.email,
            budget.phone,
            budget.service,
            budget.details,
            budget.company,
            budget.city,
            now_timestamp(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(id, "stored budget request");
    Ok(id)
}

pub fn get_budget(conn: &Connection, id: i64) -> Result<Budget, InboxError> {
    conn.query_row(
        "SELECT id, name, email, phone, service, details, company, city, created_at
         FROM budgets WHERE id = ?1",
        [id],
        map_row_to_budget,
    )
    .optional()?
    .ok_or(InboxError::NotFound { kind: "budget", id })
}

/// Lists budget requests newest first.
pub fn list_budgets(conn: &Connection, page: PageRequest) -> Result<Page<Budget>, InboxError> {
    let total: i64 = conn.query_row("SELECT COUNT(1) FROM budgets", [], |row| row.get(0))?;

    let mut stmt = conn.prepare(
        "SELECT id, name, email, phone, service, details, company, city, created_at
         FROM budgets
         ORDER BY datetime(created_at) DESC, id DESC
         LIMIT ?1 OFFSET ?2",
    )?;
    let rows = stmt.query_map(params![page.page_size(), page.offset()], map_row_to_budget)?;
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

/// Applies a partial update and returns the updated budget request.
pub fn update_budget(
    conn: &Connection,
    id: i64,
    update: BudgetUpdate,
) -> Result<Budget, InboxError> {
    let columns = update.columns()?;
    if !columns.is_empty() && update_columns(conn, "budgets", id, &columns)? == 0 {
        return Err(InboxError::NotFound { kind: "budget", id });
    }
    get_budget(conn, id)
}

pub fn delete_budget(conn: &Connection, id: i64) -> Result<(), InboxError> {
    let deleted = conn.execute("DELETE FROM budgets WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(InboxError::NotFound { kind: "budget", id });
    }
    Ok(())
}

fn map_row_to_budget(row: &Row) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        service: row.get("service")?,
        details: row.get("details")?,
        company: row.get("company")?,
        city: row.get("city")?,
        created_at: row.get("created_at")?,
    })
}
