//! Admin dashboard handlers: invoice lifecycle, clients, projects.

use std::collections::HashMap;

use axum::extract::State;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Path};
use crate::models::{CreateProject, CreateUser, NewLineItem, Project, User};
use crate::sync;

#[derive(Deserialize)]
pub struct InvoicePath {
    pub id: String,
}

// ============ Invoice lifecycle ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub client_id: String,
    pub line_items: Vec<NewLineItem>,
    /// Requested due date, YYYY-MM-DD.
    pub due_date: String,
    pub project_id: Option<String>,
    /// Finalize and send immediately after creation.
    #[serde(default)]
    pub auto_send: bool,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Days from today until the requested due date, floored at 1 - Stripe
/// rejects zero.
fn days_until_due(due_date: &str) -> Result<i64> {
    let due = NaiveDate::parse_from_str(due_date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(msg::INVALID_DUE_DATE.into()))?;
    let days = (due - Utc::now().date_naive()).num_days();
    Ok(days.max(1))
}

/// POST /api/admin/invoices/create
///
/// Create a draft Stripe invoice for a client, push the requested lines as
/// invoice items, then re-fetch and sync the result into the local store.
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(req): Json<CreateInvoiceRequest>,
) -> Result<Json<Value>> {
    if req.line_items.is_empty() {
        return Err(AppError::BadRequest(msg::LINE_ITEMS_EMPTY.into()));
    }
    let days = days_until_due(&req.due_date)?;

    let mut conn = state.db.get()?;

    queries::get_user_by_id(&conn, &req.client_id)?.or_not_found(msg::CLIENT_NOT_FOUND)?;
    let customer_id =
        sync::get_or_create_customer(&mut conn, state.billing.as_ref(), &req.client_id).await?;

    let mut metadata = req.metadata.clone();
    metadata.insert("client_id".to_string(), req.client_id.clone());
    if let Some(project_id) = &req.project_id {
        metadata.insert("project_id".to_string(), project_id.clone());
    }

    let draft = state
        .billing
        .create_invoice(&customer_id, days, &metadata)
        .await?;

    for item in &req.line_items {
        state
            .billing
            .create_invoice_item(
                &customer_id,
                &draft.id,
                &item.description,
                item.unit_amount_cents(),
                item.quantity,
            )
            .await?;
    }

    // Re-fetch with lines expanded; the draft response has no items yet.
    let full = state.billing.get_invoice(&draft.id).await?;
    let invoice = sync::sync_invoice(&mut conn, &full)?;

    if let Some(project_id) = &req.project_id {
        queries::set_invoice_project(&conn, &invoice.id, project_id)?;
    }

    if req.auto_send {
        state.billing.finalize_invoice(&draft.id).await?;
        state.billing.send_invoice(&draft.id).await?;
        let sent = state.billing.get_invoice(&draft.id).await?;
        sync::sync_invoice(&mut conn, &sent)?;
    }

    let detail = queries::invoice_with_lines(&conn, &invoice.id)?
        .or_not_found(msg::INVOICE_NOT_FOUND)?;

    Ok(Json(json!({
        "success": true,
        "invoice": detail,
        "stripeInvoiceId": draft.id,
    })))
}

/// POST /api/admin/invoices/{id}/finalize
///
/// Finalize and send the linked Stripe invoice, then re-sync.
pub async fn finalize_invoice(
    State(state): State<AppState>,
    Path(path): Path<InvoicePath>,
) -> Result<Json<Value>> {
    let mut conn = state.db.get()?;

    let invoice = queries::get_invoice(&conn, &path.id)?.or_not_found(msg::INVOICE_NOT_FOUND)?;
    // Finalizing an invoice that was never pushed to Stripe reads as missing.
    let stripe_id = invoice
        .stripe_invoice_id
        .ok_or_else(|| AppError::NotFound(msg::INVOICE_NOT_LINKED.to_string()))?;

    state.billing.finalize_invoice(&stripe_id).await?;
    state.billing.send_invoice(&stripe_id).await?;

    let full = state.billing.get_invoice(&stripe_id).await?;
    let synced = sync::sync_invoice(&mut conn, &full)?;

    Ok(Json(json!({
        "success": true,
        "message": "Invoice finalized and sent",
        "hostedUrl": synced.hosted_invoice_url,
    })))
}

/// POST /api/admin/invoices/{id}/sync
pub async fn sync_invoice(
    State(state): State<AppState>,
    Path(path): Path<InvoicePath>,
) -> Result<Json<Value>> {
    let mut conn = state.db.get()?;

    let invoice = queries::get_invoice(&conn, &path.id)?.or_not_found(msg::INVOICE_NOT_FOUND)?;
    let stripe_id = invoice
        .stripe_invoice_id
        .ok_or_else(|| AppError::NotLinked(msg::INVOICE_NOT_LINKED.to_string()))?;

    let full = state.billing.get_invoice(&stripe_id).await?;
    let synced = sync::sync_invoice(&mut conn, &full)?;
    let detail = queries::invoice_with_lines(&conn, &synced.id)?
        .or_not_found(msg::INVOICE_NOT_FOUND)?;

    Ok(Json(json!({
        "success": true,
        "invoice": detail,
    })))
}

/// POST /api/admin/invoices/sync-all
///
/// Re-sync every linked invoice. Per-item failures are counted, not fatal.
pub async fn sync_all_invoices(State(state): State<AppState>) -> Result<Json<Value>> {
    let mut conn = state.db.get()?;

    let report = sync::sync_all(&mut conn, state.billing.as_ref()).await?;

    Ok(Json(json!({
        "success": true,
        "synced": report.synced,
        "errors": report.errors,
        "total": report.total,
    })))
}

/// POST /api/admin/invoices/{id}/payment-intent
///
/// Admin surface: no ownership check.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Path(path): Path<InvoicePath>,
) -> Result<Json<Value>> {
    let mut conn = state.db.get()?;

    match sync::create_payment_intent(&mut conn, state.billing.as_ref(), &path.id, None).await? {
        sync::PaymentIntentOutcome::Hosted { hosted_invoice_url } => Ok(Json(json!({
            "hostedInvoiceUrl": hosted_invoice_url,
            "useStripeHosted": true,
        }))),
        sync::PaymentIntentOutcome::Created { client_secret } => Ok(Json(json!({
            "clientSecret": client_secret,
        }))),
    }
}

/// GET /api/admin/invoices
pub async fn list_invoices(
    State(state): State<AppState>,
) -> Result<Json<Vec<crate::models::Invoice>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_invoices(&conn)?))
}

// ============ Clients ============

/// Client row plus the API key, returned only at creation time.
#[derive(Serialize)]
pub struct CreatedClient {
    #[serde(flatten)]
    pub user: User,
    pub api_key: String,
}

/// GET /api/admin/clients
pub async fn list_clients(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_clients(&conn)?))
}

/// POST /api/admin/clients
pub async fn create_client(
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> Result<Json<CreatedClient>> {
    input.validate()?;
    let conn = state.db.get()?;
    let user = queries::create_user(&conn, &input)?;
    let api_key = user.api_key.clone();
    Ok(Json(CreatedClient { user, api_key }))
}

// ============ Projects ============

/// GET /api/admin/projects
pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_projects(&conn)?))
}

/// POST /api/admin/projects
pub async fn create_project(
    State(state): State<AppState>,
    Json(input): Json<CreateProject>,
) -> Result<Json<Project>> {
    let conn = state.db.get()?;
    queries::get_user_by_id(&conn, &input.client_id)?.or_not_found(msg::CLIENT_NOT_FOUND)?;
    Ok(Json(queries::create_project(&conn, &input)?))
}
