mod stripe;

pub use stripe::StripeClient;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

/// Payment provider operations the invoice pipeline depends on.
///
/// `StripeClient` is the production implementation; tests substitute a
/// recording mock so the pipeline runs without network access.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn create_customer(&self, email: &str, name: &str) -> Result<StripeCustomer>;

    /// Create a draft invoice for a customer. `days_until_due` is always >= 1.
    async fn create_invoice(
        &self,
        customer_id: &str,
        days_until_due: i64,
        metadata: &HashMap<String, String>,
    ) -> Result<StripeInvoice>;

    /// Add one line to a draft invoice. Unit amount is in minor units; the
    /// provider computes the line amount as unit_amount * quantity.
    async fn create_invoice_item(
        &self,
        customer_id: &str,
        invoice_id: &str,
        description: &str,
        unit_amount_cents: i64,
        quantity: i64,
    ) -> Result<()>;

    async fn finalize_invoice(&self, invoice_id: &str) -> Result<StripeInvoice>;

    async fn send_invoice(&self, invoice_id: &str) -> Result<StripeInvoice>;

    /// Retrieve an invoice with its line items expanded.
    async fn get_invoice(&self, invoice_id: &str) -> Result<StripeInvoice>;

    async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<StripePaymentIntent>;
}

// ============ Wire types ============
//
// Typed adapters for the Stripe payloads the pipeline reads. Parsing happens
// once at this boundary; everything past it works with these structs.

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomer {
    pub id: String,
    pub email: Option<String>,
}

/// A Stripe invoice as retrieved from the API.
///
/// Amounts are integer minor units; dates are epoch seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoice {
    pub id: String,
    pub status: String,
    pub number: Option<String>,
    /// Customer reference (cus_xxx).
    pub customer: Option<String>,
    pub customer_email: Option<String>,
    pub subtotal: Option<i64>,
    pub tax: Option<i64>,
    pub total: Option<i64>,
    pub currency: Option<String>,
    pub created: Option<i64>,
    pub due_date: Option<i64>,
    pub invoice_pdf: Option<String>,
    pub hosted_invoice_url: Option<String>,
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub lines: Option<StripeList<StripeInvoiceLine>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoiceLine {
    pub id: String,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    /// Line amount in minor units - the source of truth, never recomputed.
    pub amount: i64,
}

/// Stripe's list envelope (`{"object": "list", "data": [...]}`).
#[derive(Debug, Clone, Deserialize)]
pub struct StripeList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentIntent {
    pub id: String,
    pub client_secret: String,
}
