use std::collections::HashMap;

use serde::{Deserialize, Serialize, Serializer};

/// Internal invoice lifecycle status.
///
/// Serialized capitalized ("Draft", "Sent", ...) to match the portal UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Sent => "Sent",
            Self::Paid => "Paid",
            Self::Overdue => "Overdue",
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(Self::Draft),
            "Sent" => Ok(Self::Sent),
            "Paid" => Ok(Self::Paid),
            "Overdue" => Ok(Self::Overdue),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialize a minor-unit amount as a decimal number (2500_00 -> 2500.0).
///
/// Amounts are stored as integer cents; the API exposes decimal currency
/// units, matching what Stripe's dashboard and the portal UI show.
fn cents_as_decimal<S: Serializer>(cents: &i64, ser: S) -> Result<S::Ok, S::Error> {
    ser.serialize_f64(*cents as f64 / 100.0)
}

/// A locally stored invoice, normalized from Stripe on every sync.
#[derive(Debug, Clone, Serialize)]
pub struct Invoice {
    pub id: String,
    /// Stripe invoice reference (in_xxx). Unique when present - upsert key.
    pub stripe_invoice_id: Option<String>,
    pub invoice_number: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Calendar dates (YYYY-MM-DD), converted from Stripe epoch seconds.
    pub issue_date: String,
    pub due_date: String,
    #[serde(rename = "subtotal", serialize_with = "cents_as_decimal")]
    pub subtotal_cents: i64,
    #[serde(rename = "tax", serialize_with = "cents_as_decimal")]
    pub tax_cents: i64,
    #[serde(rename = "total_amount", serialize_with = "cents_as_decimal")]
    pub total_cents: i64,
    pub status: InvoiceStatus,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosted_invoice_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    pub metadata: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A single invoice line, fully replaced from Stripe on every sync.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceLineItem {
    pub id: String,
    pub invoice_id: String,
    pub description: String,
    pub quantity: i64,
    #[serde(rename = "rate", serialize_with = "cents_as_decimal")]
    pub unit_rate_cents: i64,
    #[serde(rename = "amount", serialize_with = "cents_as_decimal")]
    pub amount_cents: i64,
    /// Provider-supplied order.
    pub position: i64,
}

/// Normalized invoice fields produced by the synchronizer, ready to upsert.
#[derive(Debug, Clone)]
pub struct InvoiceUpsert {
    pub stripe_invoice_id: String,
    pub invoice_number: String,
    pub client_id: String,
    pub issue_date: String,
    pub due_date: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub status: InvoiceStatus,
    pub currency: String,
    pub pdf_url: Option<String>,
    pub hosted_invoice_url: Option<String>,
    pub payment_intent_id: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// Normalized line produced by the synchronizer.
#[derive(Debug, Clone)]
pub struct LineItemUpsert {
    pub description: String,
    pub quantity: i64,
    pub unit_rate_cents: i64,
    pub amount_cents: i64,
}

/// A requested line on an admin "create invoice" call. Rate is in decimal
/// currency units as typed in the dashboard form.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLineItem {
    pub description: String,
    pub quantity: i64,
    pub rate: f64,
}

impl NewLineItem {
    /// Minor-unit rate for Stripe: round(rate * 100).
    pub fn unit_amount_cents(&self) -> i64 {
        (self.rate * 100.0).round() as i64
    }
}
