//! Client-portal handlers. Every lookup is scoped to the authenticated user.

use axum::{Extension, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::db::{AppState, queries};
use crate::error::{OptionExt, Result, msg};
use crate::extractors::{Json, Path};
use crate::middleware::AuthUser;
use crate::models::{Document, Invoice, Project};
use crate::sync;

#[derive(Deserialize)]
pub struct InvoicePath {
    pub id: String,
}

/// GET /api/invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Invoice>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_invoices_by_client(&conn, &user.id)?))
}

/// GET /api/invoices/{id}
///
/// Another client's invoice reads as missing rather than forbidden, so ids
/// cannot be probed.
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(path): Path<InvoicePath>,
) -> Result<Json<queries::InvoiceDetail>> {
    let conn = state.db.get()?;
    let detail =
        queries::invoice_with_lines(&conn, &path.id)?.or_not_found(msg::INVOICE_NOT_FOUND)?;
    if detail.invoice.client_id != user.id {
        return Err(crate::error::AppError::NotFound(
            msg::INVOICE_NOT_FOUND.into(),
        ));
    }
    Ok(Json(detail))
}

/// POST /api/invoices/{id}/payment-intent
///
/// Ownership-checked; a Stripe-hosted invoice short-circuits to its URL.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(path): Path<InvoicePath>,
) -> Result<Json<Value>> {
    let mut conn = state.db.get()?;

    match sync::create_payment_intent(&mut conn, state.billing.as_ref(), &path.id, Some(&user.id))
        .await?
    {
        sync::PaymentIntentOutcome::Hosted { hosted_invoice_url } => Ok(Json(json!({
            "hostedInvoiceUrl": hosted_invoice_url,
            "useStripeHosted": true,
        }))),
        sync::PaymentIntentOutcome::Created { client_secret } => Ok(Json(json!({
            "clientSecret": client_secret,
            "useStripeHosted": false,
        }))),
    }
}

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Project>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_projects_by_client(&conn, &user.id)?))
}

/// GET /api/documents
pub async fn list_documents(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Document>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_documents_by_client(&conn, &user.id)?))
}
