use chrono::Utc;
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

use super::from_row::{
    DOCUMENT_COLS, FromRow, INVOICE_COLS, LINE_ITEM_COLS, PROJECT_COLS, USER_COLS, query_all,
    query_one,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a portal API key. Prefixed so keys are recognizable in logs.
fn gen_api_key() -> String {
    format!("atk_{}", Uuid::new_v4().simple())
}

// ============ Users ============

pub fn create_user(conn: &Connection, input: &CreateUser) -> Result<User> {
    let id = gen_id();
    let api_key = gen_api_key();
    let now = now();
    let email = input.email.trim().to_lowercase();

    conn.execute(
        "INSERT INTO users (id, email, full_name, role, company, phone, api_key, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            &id,
            &email,
            &input.full_name,
            input.role.as_str(),
            &input.company,
            &input.phone,
            &api_key,
            now,
            now
        ],
    )?;

    Ok(User {
        id,
        email,
        full_name: input.full_name.clone(),
        role: input.role,
        company: input.company.clone(),
        phone: input.phone.clone(),
        stripe_customer_id: None,
        api_key,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let email = email.trim().to_lowercase();
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        &[&email],
    )
}

pub fn get_user_by_stripe_customer(
    conn: &Connection,
    stripe_customer_id: &str,
) -> Result<Option<User>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM users WHERE stripe_customer_id = ?1",
            USER_COLS
        ),
        &[&stripe_customer_id],
    )
}

pub fn get_user_by_api_key(conn: &Connection, api_key: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE api_key = ?1", USER_COLS),
        &[&api_key],
    )
}

/// Persist the Stripe customer reference on a user row.
pub fn set_stripe_customer_id(conn: &Connection, user_id: &str, customer_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE users SET stripe_customer_id = ?1, updated_at = ?2 WHERE id = ?3",
        params![customer_id, now(), user_id],
    )?;
    Ok(affected > 0)
}

pub fn list_clients(conn: &Connection) -> Result<Vec<User>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM users WHERE role = 'client' ORDER BY created_at DESC",
            USER_COLS
        ),
        &[],
    )
}

// ============ Invoices ============

/// Upsert an invoice keyed by its Stripe reference.
///
/// Insert if the reference is unseen, otherwise update every synced field.
/// `created_at` survives updates; `synced_at` and `updated_at` always move.
pub fn upsert_invoice_by_stripe_id(conn: &Connection, up: &InvoiceUpsert) -> Result<Invoice> {
    let now = now();
    let metadata = serde_json::to_string(&up.metadata)?;

    let invoice = conn.query_row(
        &format!(
            "INSERT INTO invoices (
                id, stripe_invoice_id, invoice_number, client_id, project_id,
                issue_date, due_date, subtotal_cents, tax_cents, total_cents,
                status, currency, pdf_url, hosted_invoice_url, payment_intent_id,
                metadata, synced_at, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16, ?16)
             ON CONFLICT(stripe_invoice_id) DO UPDATE SET
                invoice_number = excluded.invoice_number,
                client_id = excluded.client_id,
                issue_date = excluded.issue_date,
                due_date = excluded.due_date,
                subtotal_cents = excluded.subtotal_cents,
                tax_cents = excluded.tax_cents,
                total_cents = excluded.total_cents,
                status = excluded.status,
                currency = excluded.currency,
                pdf_url = excluded.pdf_url,
                hosted_invoice_url = excluded.hosted_invoice_url,
                payment_intent_id = COALESCE(excluded.payment_intent_id, invoices.payment_intent_id),
                metadata = excluded.metadata,
                synced_at = excluded.synced_at,
                updated_at = excluded.updated_at
             RETURNING {}",
            INVOICE_COLS
        ),
        params![
            gen_id(),
            &up.stripe_invoice_id,
            &up.invoice_number,
            &up.client_id,
            &up.issue_date,
            &up.due_date,
            up.subtotal_cents,
            up.tax_cents,
            up.total_cents,
            up.status.as_str(),
            &up.currency,
            &up.pdf_url,
            &up.hosted_invoice_url,
            &up.payment_intent_id,
            &metadata,
            now,
        ],
        Invoice::from_row,
    )?;

    Ok(invoice)
}

pub fn get_invoice(conn: &Connection, id: &str) -> Result<Option<Invoice>> {
    query_one(
        conn,
        &format!("SELECT {} FROM invoices WHERE id = ?1", INVOICE_COLS),
        &[&id],
    )
}

pub fn get_invoice_by_stripe_id(
    conn: &Connection,
    stripe_invoice_id: &str,
) -> Result<Option<Invoice>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM invoices WHERE stripe_invoice_id = ?1",
            INVOICE_COLS
        ),
        &[&stripe_invoice_id],
    )
}

pub fn list_invoices(conn: &Connection) -> Result<Vec<Invoice>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM invoices ORDER BY created_at DESC",
            INVOICE_COLS
        ),
        &[],
    )
}

pub fn list_invoices_by_client(conn: &Connection, client_id: &str) -> Result<Vec<Invoice>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM invoices WHERE client_id = ?1 ORDER BY created_at DESC",
            INVOICE_COLS
        ),
        &[&client_id],
    )
}

/// Stripe references of every linked local invoice, for batch sync.
pub fn list_linked_stripe_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT stripe_invoice_id FROM invoices
         WHERE stripe_invoice_id IS NOT NULL ORDER BY created_at",
    )?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

/// Associate an invoice with a project. The sync upsert never touches this.
pub fn set_invoice_project(conn: &Connection, invoice_id: &str, project_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE invoices SET project_id = ?1, updated_at = ?2 WHERE id = ?3",
        params![project_id, now(), invoice_id],
    )?;
    Ok(affected > 0)
}

pub fn set_invoice_payment_intent(
    conn: &Connection,
    invoice_id: &str,
    payment_intent_id: &str,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE invoices SET payment_intent_id = ?1, updated_at = ?2 WHERE id = ?3",
        params![payment_intent_id, now(), invoice_id],
    )?;
    Ok(affected > 0)
}

// ============ Line items ============

/// Replace all line items for an invoice with the provider's current set.
///
/// Delete-all-then-insert, preserving provider order via `position`.
pub fn replace_line_items(
    conn: &Connection,
    invoice_id: &str,
    lines: &[LineItemUpsert],
) -> Result<Vec<InvoiceLineItem>> {
    conn.execute(
        "DELETE FROM invoice_line_items WHERE invoice_id = ?1",
        params![invoice_id],
    )?;

    let mut inserted = Vec::with_capacity(lines.len());
    for (position, line) in lines.iter().enumerate() {
        let id = gen_id();
        conn.execute(
            "INSERT INTO invoice_line_items
                (id, invoice_id, description, quantity, unit_rate_cents, amount_cents, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &id,
                invoice_id,
                &line.description,
                line.quantity,
                line.unit_rate_cents,
                line.amount_cents,
                position as i64,
            ],
        )?;
        inserted.push(InvoiceLineItem {
            id,
            invoice_id: invoice_id.to_string(),
            description: line.description.clone(),
            quantity: line.quantity,
            unit_rate_cents: line.unit_rate_cents,
            amount_cents: line.amount_cents,
            position: position as i64,
        });
    }

    Ok(inserted)
}

pub fn get_line_items(conn: &Connection, invoice_id: &str) -> Result<Vec<InvoiceLineItem>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM invoice_line_items WHERE invoice_id = ?1 ORDER BY position",
            LINE_ITEM_COLS
        ),
        &[&invoice_id],
    )
}

// ============ Projects ============

pub fn create_project(conn: &Connection, input: &CreateProject) -> Result<Project> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO projects (id, client_id, name, description, status, progress, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 'proposal', 0, ?5, ?5)",
        params![&id, &input.client_id, &input.name, &input.description, now],
    )?;

    Ok(Project {
        id,
        client_id: input.client_id.clone(),
        name: input.name.clone(),
        description: input.description.clone(),
        status: ProjectStatus::Proposal,
        progress: 0,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_project(conn: &Connection, id: &str) -> Result<Option<Project>> {
    query_one(
        conn,
        &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLS),
        &[&id],
    )
}

pub fn list_projects(conn: &Connection) -> Result<Vec<Project>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM projects ORDER BY created_at DESC",
            PROJECT_COLS
        ),
        &[],
    )
}

pub fn list_projects_by_client(conn: &Connection, client_id: &str) -> Result<Vec<Project>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM projects WHERE client_id = ?1 ORDER BY created_at DESC",
            PROJECT_COLS
        ),
        &[&client_id],
    )
}

// ============ Documents ============

pub fn create_document(
    conn: &Connection,
    client_id: &str,
    project_id: Option<&str>,
    name: &str,
    url: &str,
) -> Result<Document> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO documents (id, client_id, project_id, name, url, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, client_id, &project_id, name, url, now],
    )?;

    Ok(Document {
        id,
        client_id: client_id.to_string(),
        project_id: project_id.map(|s| s.to_string()),
        name: name.to_string(),
        url: url.to_string(),
        created_at: now,
    })
}

pub fn list_documents_by_client(conn: &Connection, client_id: &str) -> Result<Vec<Document>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM documents WHERE client_id = ?1 ORDER BY created_at DESC",
            DOCUMENT_COLS
        ),
        &[&client_id],
    )
}

/// Invoice with its current line items, the shape returned by sync.
pub fn invoice_with_lines(conn: &Connection, invoice_id: &str) -> Result<Option<InvoiceDetail>> {
    let Some(invoice) = get_invoice(conn, invoice_id)? else {
        return Ok(None);
    };
    let line_items = get_line_items(conn, invoice_id)?;
    Ok(Some(InvoiceDetail {
        invoice,
        line_items,
    }))
}

/// An invoice together with its line items.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub line_items: Vec<InvoiceLineItem>,
}
