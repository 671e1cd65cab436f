//! Stripe -> local store invoice synchronization.
//!
//! The pipeline: a lifecycle operation fetches an invoice from Stripe, hands
//! it to [`sync_invoice`], which maps the status, resolves the owning user,
//! upserts the normalized row, and replaces its line items. Re-syncing the
//! same payload is idempotent apart from `synced_at`.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::models::{Invoice, InvoiceStatus, InvoiceUpsert, LineItemUpsert};
use crate::payments::{BillingProvider, StripeInvoice};

/// Map a Stripe invoice status onto the internal status enum.
///
/// Fail-open: unknown statuses map to Draft rather than erroring, so a new
/// provider status never breaks sync. "void" also maps to Draft, matching
/// the portal's behavior of treating voided invoices as unsent.
pub fn map_stripe_status(status: &str) -> InvoiceStatus {
    match status {
        "draft" => InvoiceStatus::Draft,
        "open" => InvoiceStatus::Sent,
        "paid" => InvoiceStatus::Paid,
        "void" => InvoiceStatus::Draft,
        "uncollectible" => InvoiceStatus::Overdue,
        _ => InvoiceStatus::Draft,
    }
}

/// Look up or create the Stripe customer for a user.
///
/// A stored reference is returned without touching the provider. Otherwise
/// the customer is created upstream and the reference persisted. There is no
/// locking here: concurrent calls for the same user can race and create
/// duplicate Stripe customers. Acceptable at manual-admin call volume.
pub async fn get_or_create_customer(
    conn: &mut Connection,
    provider: &dyn BillingProvider,
    user_id: &str,
) -> Result<String> {
    let user = queries::get_user_by_id(conn, user_id)?
        .ok_or_else(|| AppError::NotFound(crate::error::msg::CLIENT_NOT_FOUND.to_string()))?;

    if let Some(customer_id) = user.stripe_customer_id {
        return Ok(customer_id);
    }

    let customer = provider.create_customer(&user.email, &user.full_name).await?;
    queries::set_stripe_customer_id(conn, user_id, &customer.id)?;

    tracing::info!(
        "Created Stripe customer {} for user {}",
        customer.id,
        user_id
    );

    Ok(customer.id)
}

/// Epoch seconds -> calendar date string (YYYY-MM-DD). Out-of-range
/// timestamps fall back to today.
fn epoch_to_date(secs: Option<i64>) -> String {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
        .unwrap_or_else(Utc::now)
        .date_naive()
        .to_string()
}

/// Synthesized number for invoices Stripe has not numbered yet.
fn draft_number(stripe_invoice_id: &str) -> String {
    let tail = &stripe_invoice_id[stripe_invoice_id.len().saturating_sub(8)..];
    format!("DRAFT-{}", tail)
}

/// Resolve the local user owning a Stripe invoice.
///
/// Billing email wins; the customer reference is the fallback. No owner is
/// fatal for this sync - an invoice cannot be written without one.
fn resolve_owner(conn: &Connection, inv: &StripeInvoice) -> Result<String> {
    if let Some(email) = &inv.customer_email
        && let Some(user) = queries::get_user_by_email(conn, email)?
    {
        return Ok(user.id);
    }

    if let Some(customer) = &inv.customer
        && let Some(user) = queries::get_user_by_stripe_customer(conn, customer)?
    {
        return Ok(user.id);
    }

    Err(AppError::UserResolution(format!(
        "No local user for Stripe invoice {} (email: {:?}, customer: {:?})",
        inv.id, inv.customer_email, inv.customer
    )))
}

/// Normalize a fetched Stripe invoice into upsert-ready records.
fn normalize(conn: &Connection, inv: &StripeInvoice) -> Result<(InvoiceUpsert, Vec<LineItemUpsert>)> {
    let client_id = resolve_owner(conn, inv)?;

    let invoice_number = inv
        .number
        .clone()
        .unwrap_or_else(|| draft_number(&inv.id));

    let issue_date = epoch_to_date(inv.created);
    let due_date = match inv.due_date {
        Some(secs) => epoch_to_date(Some(secs)),
        None => issue_date.clone(),
    };

    let upsert = InvoiceUpsert {
        stripe_invoice_id: inv.id.clone(),
        invoice_number,
        client_id,
        issue_date,
        due_date,
        subtotal_cents: inv.subtotal.unwrap_or(0),
        tax_cents: inv.tax.unwrap_or(0),
        total_cents: inv.total.unwrap_or(0),
        status: map_stripe_status(&inv.status),
        currency: inv
            .currency
            .clone()
            .unwrap_or_else(|| "usd".to_string())
            .to_lowercase(),
        pdf_url: inv.invoice_pdf.clone(),
        hosted_invoice_url: inv.hosted_invoice_url.clone(),
        payment_intent_id: inv.payment_intent.clone(),
        metadata: inv.metadata.clone(),
    };

    let lines = inv
        .lines
        .as_ref()
        .map(|l| l.data.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|line| {
            let quantity = line.quantity.unwrap_or(1);
            // The provider's amount is the source of truth; the unit rate is
            // derived from it, never the other way around. Quantity zero
            // takes the full amount as the rate.
            let unit_rate_cents = if quantity != 0 {
                line.amount / quantity
            } else {
                line.amount
            };
            LineItemUpsert {
                description: line.description.clone().unwrap_or_default(),
                quantity,
                unit_rate_cents,
                amount_cents: line.amount,
            }
        })
        .collect();

    Ok((upsert, lines))
}

/// Upsert a fetched Stripe invoice and replace its line items.
///
/// Both writes run in one transaction so a failure mid-sync cannot leave an
/// invoice with stale or missing lines.
pub fn sync_invoice(conn: &mut Connection, inv: &StripeInvoice) -> Result<Invoice> {
    let (upsert, lines) = normalize(conn, inv)?;

    let tx = conn.transaction()?;
    let invoice = queries::upsert_invoice_by_stripe_id(&tx, &upsert)?;
    queries::replace_line_items(&tx, &invoice.id, &lines)?;
    tx.commit()?;

    tracing::info!(
        "Synced invoice {} ({}, status {})",
        invoice.id,
        inv.id,
        invoice.status
    );

    Ok(invoice)
}

/// Result of asking for a payment handshake on an invoice.
#[derive(Debug, Clone)]
pub enum PaymentIntentOutcome {
    /// The invoice already has a Stripe-hosted payment page; no intent created.
    Hosted { hosted_invoice_url: String },
    /// A fresh payment intent, confirmable client-side with this secret.
    Created { client_secret: String },
}

/// Create a payment-confirmation handshake for an invoice.
///
/// Guards, in order: the invoice must exist; when `requester_id` is given it
/// must own the invoice (the admin surface passes None); a Paid invoice is
/// rejected before any provider call. An invoice that already carries a
/// hosted payment page short-circuits to that URL instead of a new intent.
pub async fn create_payment_intent(
    conn: &mut Connection,
    provider: &dyn BillingProvider,
    invoice_id: &str,
    requester_id: Option<&str>,
) -> Result<PaymentIntentOutcome> {
    let invoice = queries::get_invoice(conn, invoice_id)?
        .ok_or_else(|| AppError::NotFound(crate::error::msg::INVOICE_NOT_FOUND.to_string()))?;

    if let Some(requester) = requester_id
        && invoice.client_id != requester
    {
        return Err(AppError::Forbidden(
            "Invoice belongs to another client".to_string(),
        ));
    }

    if invoice.status == InvoiceStatus::Paid {
        return Err(AppError::AlreadyPaid(
            crate::error::msg::INVOICE_ALREADY_PAID.to_string(),
        ));
    }

    if let Some(url) = invoice.hosted_invoice_url {
        return Ok(PaymentIntentOutcome::Hosted {
            hosted_invoice_url: url,
        });
    }

    let mut metadata = std::collections::HashMap::new();
    metadata.insert("invoice_id".to_string(), invoice.id.clone());
    metadata.insert("invoice_number".to_string(), invoice.invoice_number.clone());

    let intent = provider
        .create_payment_intent(invoice.total_cents, &invoice.currency, &metadata)
        .await?;
    queries::set_invoice_payment_intent(conn, &invoice.id, &intent.id)?;

    tracing::info!(
        "Created payment intent {} for invoice {}",
        intent.id,
        invoice.id
    );

    Ok(PaymentIntentOutcome::Created {
        client_secret: intent.client_secret,
    })
}

/// Outcome of a batch sync.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SyncReport {
    pub synced: usize,
    pub errors: usize,
    pub total: usize,
}

/// Fetch and re-sync every linked invoice, sequentially.
///
/// A single invoice's failure is logged and counted, never aborts the batch.
pub async fn sync_all(conn: &mut Connection, provider: &dyn BillingProvider) -> Result<SyncReport> {
    let stripe_ids = queries::list_linked_stripe_ids(conn)?;
    let total = stripe_ids.len();
    let mut synced = 0;
    let mut errors = 0;

    for stripe_id in stripe_ids {
        let result = match provider.get_invoice(&stripe_id).await {
            Ok(inv) => sync_invoice(conn, &inv).map(|_| ()),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => synced += 1,
            Err(e) => {
                errors += 1;
                tracing::warn!("Failed to sync invoice {}: {}", stripe_id, e);
            }
        }
    }

    tracing::info!("Batch sync complete: {}/{} synced, {} errors", synced, total, errors);

    Ok(SyncReport {
        synced,
        errors,
        total,
    })
}
