//! Row mapping trait and helpers for reducing boilerplate in queries.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupted values.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
///
/// Implementing this trait allows using the `query_one` and `query_all`
/// helper functions, reducing repetitive row mapping closures.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str = "id, email, full_name, role, company, phone, stripe_customer_id, api_key, created_at, updated_at";

pub const INVOICE_COLS: &str = "id, stripe_invoice_id, invoice_number, client_id, project_id, issue_date, due_date, subtotal_cents, tax_cents, total_cents, status, currency, pdf_url, hosted_invoice_url, payment_intent_id, metadata, synced_at, created_at, updated_at";

pub const LINE_ITEM_COLS: &str =
    "id, invoice_id, description, quantity, unit_rate_cents, amount_cents, position";

pub const PROJECT_COLS: &str =
    "id, client_id, name, description, status, progress, created_at, updated_at";

pub const DOCUMENT_COLS: &str = "id, client_id, project_id, name, url, created_at";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            full_name: row.get(2)?,
            role: parse_enum(row, 3, "role")?,
            company: row.get(4)?,
            phone: row.get(5)?,
            stripe_customer_id: row.get(6)?,
            api_key: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

impl FromRow for Invoice {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        // Metadata is stored as a JSON object; unreadable values fall back
        // to empty rather than failing the whole row.
        let metadata: HashMap<String, String> = row
            .get::<_, String>(15)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();
        Ok(Invoice {
            id: row.get(0)?,
            stripe_invoice_id: row.get(1)?,
            invoice_number: row.get(2)?,
            client_id: row.get(3)?,
            project_id: row.get(4)?,
            issue_date: row.get(5)?,
            due_date: row.get(6)?,
            subtotal_cents: row.get(7)?,
            tax_cents: row.get(8)?,
            total_cents: row.get(9)?,
            status: parse_enum(row, 10, "status")?,
            currency: row.get(11)?,
            pdf_url: row.get(12)?,
            hosted_invoice_url: row.get(13)?,
            payment_intent_id: row.get(14)?,
            metadata,
            synced_at: row.get(16)?,
            created_at: row.get(17)?,
            updated_at: row.get(18)?,
        })
    }
}

impl FromRow for InvoiceLineItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(InvoiceLineItem {
            id: row.get(0)?,
            invoice_id: row.get(1)?,
            description: row.get(2)?,
            quantity: row.get(3)?,
            unit_rate_cents: row.get(4)?,
            amount_cents: row.get(5)?,
            position: row.get(6)?,
        })
    }
}

impl FromRow for Project {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Project {
            id: row.get(0)?,
            client_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            status: parse_enum(row, 4, "status")?,
            progress: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for Document {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Document {
            id: row.get(0)?,
            client_id: row.get(1)?,
            project_id: row.get(2)?,
            name: row.get(3)?,
            url: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}
