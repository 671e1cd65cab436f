//! Test utilities and fixtures for Atelier integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, params};

pub use atelier::db::{AppState, init_db, queries};
pub use atelier::error::{AppError, Result};
pub use atelier::models::*;
pub use atelier::payments::{
    BillingProvider, StripeCustomer, StripeInvoice, StripeInvoiceLine, StripeList,
    StripePaymentIntent,
};

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

pub fn create_test_client(conn: &Connection, email: &str) -> User {
    let input = CreateUser {
        email: email.to_string(),
        full_name: format!("Test Client {}", email),
        role: UserRole::Client,
        company: None,
        phone: None,
    };
    queries::create_user(conn, &input).expect("Failed to create test client")
}

pub fn create_test_admin(conn: &Connection, email: &str) -> User {
    let input = CreateUser {
        email: email.to_string(),
        full_name: format!("Test Admin {}", email),
        role: UserRole::Admin,
        company: None,
        phone: None,
    };
    queries::create_user(conn, &input).expect("Failed to create test admin")
}

/// Insert a local invoice row directly, bypassing sync. For fixtures that
/// need unlinked, paid, or hosted invoices.
pub fn insert_local_invoice(
    conn: &Connection,
    client_id: &str,
    status: InvoiceStatus,
    stripe_invoice_id: Option<&str>,
    hosted_invoice_url: Option<&str>,
) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();
    conn.execute(
        "INSERT INTO invoices (
            id, stripe_invoice_id, invoice_number, client_id, issue_date, due_date,
            subtotal_cents, tax_cents, total_cents, status, currency,
            hosted_invoice_url, metadata, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, '2026-01-01', '2026-02-01', 100000, 0, 100000, ?5, 'usd', ?6, '{}', ?7, ?7)",
        params![
            &id,
            &stripe_invoice_id,
            "INV-0001",
            client_id,
            status.as_str(),
            &hosted_invoice_url,
            now
        ],
    )
    .expect("Failed to insert test invoice");
    id
}

/// Build a Stripe invoice payload with test defaults.
pub fn stripe_invoice(id: &str, status: &str, customer_email: Option<&str>) -> StripeInvoice {
    StripeInvoice {
        id: id.to_string(),
        status: status.to_string(),
        number: None,
        customer: None,
        customer_email: customer_email.map(|s| s.to_string()),
        subtotal: Some(250000),
        tax: Some(0),
        total: Some(250000),
        currency: Some("usd".to_string()),
        created: Some(1_767_225_600), // 2026-01-01
        due_date: Some(1_769_904_000), // 2026-02-01
        invoice_pdf: None,
        hosted_invoice_url: None,
        payment_intent: None,
        metadata: HashMap::new(),
        lines: None,
    }
}

pub fn stripe_line(id: &str, description: &str, quantity: i64, amount: i64) -> StripeInvoiceLine {
    StripeInvoiceLine {
        id: id.to_string(),
        description: Some(description.to_string()),
        quantity: Some(quantity),
        amount,
    }
}

// ============ Mock payment provider ============

#[derive(Default)]
struct MockState {
    invoices: HashMap<String, StripeInvoice>,
    fail_ids: HashSet<String>,
    customers_created: usize,
    intents_created: usize,
    counter: usize,
}

/// Recording in-memory stand-in for the Stripe API.
///
/// Stores created invoices, lets tests script fetch failures, and counts
/// provider calls so tests can assert that guards short-circuit.
#[derive(Default)]
pub struct MockBilling {
    inner: Mutex<MockState>,
}

impl MockBilling {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register an invoice the mock will serve from `get_invoice`.
    pub fn put_invoice(&self, invoice: StripeInvoice) {
        let mut state = self.inner.lock().unwrap();
        state.invoices.insert(invoice.id.clone(), invoice);
    }

    /// Make `get_invoice` fail for this id.
    pub fn fail_on(&self, stripe_invoice_id: &str) {
        let mut state = self.inner.lock().unwrap();
        state.fail_ids.insert(stripe_invoice_id.to_string());
    }

    pub fn customers_created(&self) -> usize {
        self.inner.lock().unwrap().customers_created
    }

    pub fn intents_created(&self) -> usize {
        self.inner.lock().unwrap().intents_created
    }
}

#[async_trait]
impl BillingProvider for MockBilling {
    async fn create_customer(&self, email: &str, _name: &str) -> Result<StripeCustomer> {
        let mut state = self.inner.lock().unwrap();
        state.customers_created += 1;
        state.counter += 1;
        Ok(StripeCustomer {
            id: format!("cus_mock_{}", state.counter),
            email: Some(email.to_string()),
        })
    }

    async fn create_invoice(
        &self,
        customer_id: &str,
        days_until_due: i64,
        metadata: &HashMap<String, String>,
    ) -> Result<StripeInvoice> {
        let mut state = self.inner.lock().unwrap();
        state.counter += 1;
        let now = chrono::Utc::now().timestamp();
        let invoice = StripeInvoice {
            id: format!("in_mock_{}", state.counter),
            status: "draft".to_string(),
            number: None,
            customer: Some(customer_id.to_string()),
            customer_email: None,
            subtotal: Some(0),
            tax: Some(0),
            total: Some(0),
            currency: Some("usd".to_string()),
            created: Some(now),
            due_date: Some(now + days_until_due * 86400),
            invoice_pdf: None,
            hosted_invoice_url: None,
            payment_intent: None,
            metadata: metadata.clone(),
            lines: Some(StripeList { data: Vec::new() }),
        };
        state.invoices.insert(invoice.id.clone(), invoice.clone());
        Ok(invoice)
    }

    async fn create_invoice_item(
        &self,
        _customer_id: &str,
        invoice_id: &str,
        description: &str,
        unit_amount_cents: i64,
        quantity: i64,
    ) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        state.counter += 1;
        let line = StripeInvoiceLine {
            id: format!("il_mock_{}", state.counter),
            description: Some(description.to_string()),
            quantity: Some(quantity),
            amount: unit_amount_cents * quantity,
        };
        let invoice = state
            .invoices
            .get_mut(invoice_id)
            .ok_or_else(|| AppError::Provider("No such invoice".to_string()))?;
        let amount = line.amount;
        invoice
            .lines
            .get_or_insert_with(|| StripeList { data: Vec::new() })
            .data
            .push(line);
        invoice.subtotal = Some(invoice.subtotal.unwrap_or(0) + amount);
        invoice.total = Some(invoice.total.unwrap_or(0) + amount);
        Ok(())
    }

    async fn finalize_invoice(&self, invoice_id: &str) -> Result<StripeInvoice> {
        let mut state = self.inner.lock().unwrap();
        let invoice = state
            .invoices
            .get_mut(invoice_id)
            .ok_or_else(|| AppError::Provider("No such invoice".to_string()))?;
        invoice.status = "open".to_string();
        invoice.number = Some(format!("INV-{}", &invoice_id[invoice_id.len() - 4..]));
        invoice.hosted_invoice_url =
            Some(format!("https://pay.stripe.test/{}", invoice_id));
        Ok(invoice.clone())
    }

    async fn send_invoice(&self, invoice_id: &str) -> Result<StripeInvoice> {
        let state = self.inner.lock().unwrap();
        state
            .invoices
            .get(invoice_id)
            .cloned()
            .ok_or_else(|| AppError::Provider("No such invoice".to_string()))
    }

    async fn get_invoice(&self, invoice_id: &str) -> Result<StripeInvoice> {
        let state = self.inner.lock().unwrap();
        if state.fail_ids.contains(invoice_id) {
            return Err(AppError::Provider(format!(
                "Stripe API error (500): fetch failed for {}",
                invoice_id
            )));
        }
        state
            .invoices
            .get(invoice_id)
            .cloned()
            .ok_or_else(|| AppError::Provider("No such invoice".to_string()))
    }

    async fn create_payment_intent(
        &self,
        _amount_cents: i64,
        _currency: &str,
        _metadata: &HashMap<String, String>,
    ) -> Result<StripePaymentIntent> {
        let mut state = self.inner.lock().unwrap();
        state.intents_created += 1;
        state.counter += 1;
        Ok(StripePaymentIntent {
            id: format!("pi_mock_{}", state.counter),
            client_secret: format!("pi_mock_{}_secret", state.counter),
        })
    }
}

/// Create an AppState for testing with an in-memory database and the mock
/// provider. Pool size 1 so every caller sees the same in-memory database.
pub fn test_state(billing: Arc<MockBilling>) -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    AppState { db: pool, billing }
}
