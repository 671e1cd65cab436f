use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};

use super::{BillingProvider, StripeCustomer, StripeInvoice, StripePaymentIntent};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Stripe API client using form-encoded requests and basic auth.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
}

impl StripeClient {
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(),
            secret_key: secret_key.to_string(),
        }
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{}", STRIPE_API_BASE, path))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Stripe API error: {}", e)))?;

        Self::parse_response(response).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{}", STRIPE_API_BASE, path))
            .basic_auth(&self.secret_key, None::<&str>)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Stripe API error: {}", e)))?;

        Self::parse_response(response).await
    }

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "Stripe API error ({}): {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to parse Stripe response: {}", e)))
    }
}

fn metadata_form(prefix: &str, metadata: &HashMap<String, String>) -> Vec<(String, String)> {
    metadata
        .iter()
        .map(|(k, v)| (format!("{}[{}]", prefix, k), v.clone()))
        .collect()
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn create_customer(&self, email: &str, name: &str) -> Result<StripeCustomer> {
        self.post_form(
            "/customers",
            &[
                ("email".to_string(), email.to_string()),
                ("name".to_string(), name.to_string()),
            ],
        )
        .await
    }

    async fn create_invoice(
        &self,
        customer_id: &str,
        days_until_due: i64,
        metadata: &HashMap<String, String>,
    ) -> Result<StripeInvoice> {
        let mut form = vec![
            ("customer".to_string(), customer_id.to_string()),
            ("collection_method".to_string(), "send_invoice".to_string()),
            ("days_until_due".to_string(), days_until_due.to_string()),
            ("auto_advance".to_string(), "false".to_string()),
        ];
        form.extend(metadata_form("metadata", metadata));
        self.post_form("/invoices", &form).await
    }

    async fn create_invoice_item(
        &self,
        customer_id: &str,
        invoice_id: &str,
        description: &str,
        unit_amount_cents: i64,
        quantity: i64,
    ) -> Result<()> {
        // Stripe rejects amount+quantity together; unit_amount is the form
        // that lets the API derive the line amount.
        let form = vec![
            ("customer".to_string(), customer_id.to_string()),
            ("invoice".to_string(), invoice_id.to_string()),
            ("description".to_string(), description.to_string()),
            ("unit_amount".to_string(), unit_amount_cents.to_string()),
            ("quantity".to_string(), quantity.to_string()),
        ];
        let _: serde_json::Value = self.post_form("/invoiceitems", &form).await?;
        Ok(())
    }

    async fn finalize_invoice(&self, invoice_id: &str) -> Result<StripeInvoice> {
        self.post_form(&format!("/invoices/{}/finalize", invoice_id), &[])
            .await
    }

    async fn send_invoice(&self, invoice_id: &str) -> Result<StripeInvoice> {
        self.post_form(&format!("/invoices/{}/send", invoice_id), &[])
            .await
    }

    async fn get_invoice(&self, invoice_id: &str) -> Result<StripeInvoice> {
        self.get_json(
            &format!("/invoices/{}", invoice_id),
            &[("expand[]", "lines")],
        )
        .await
    }

    async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<StripePaymentIntent> {
        let mut form = vec![
            ("amount".to_string(), amount_cents.to_string()),
            ("currency".to_string(), currency.to_string()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        form.extend(metadata_form("metadata", metadata));
        self.post_form("/payment_intents", &form).await
    }
}
