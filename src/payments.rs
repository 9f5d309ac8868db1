//! Payment processor seam
//!
//! All money movement happens on a hosted checkout page run by an
//! external processor; this module only creates sessions, requests
//! refunds, and gives tests something to stand in for the real thing.
//! Handlers call the processor BEFORE writing local rows, so a processor
//! failure leaves no half-recorded payment behind.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Errors from the payment processor
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Processor rejected the request: {0}")]
    Declined(String),
}

/// What we ask the processor to collect
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest {
    /// Our payment ID, carried as metadata so webhook handling can
    /// cross-check deliveries
    pub payment_id: String,

    /// Amount to collect in integer cents
    pub amount_cents: i64,

    /// Shown on the hosted payment page and the receipt
    pub description: String,

    /// Receipt recipient
    pub customer_email: String,
}

/// A hosted checkout session the customer is redirected to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// The processor's reference, stored as the payment's provider_ref
    /// and echoed back by webhooks
    pub provider_ref: String,

    /// The hosted payment page
    pub url: String,
}

/// The operations the application needs from a payment processor
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates a hosted checkout session for the given amount
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, ProviderError>;

    /// Returns a completed payment's money to the customer
    async fn refund(&self, provider_ref: &str, amount_cents: i64) -> Result<(), ProviderError>;
}

/// Talks to a real payment processor over its REST API
pub struct HttpPaymentProvider {
    client: reqwest::Client,
    base_url: String,
    secret: String,
}

impl HttpPaymentProvider {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/checkout_sessions", self.base_url))
            .bearer_auth(&self.secret)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Declined(format!("{}: {}", status, body)));
        }

        Ok(response.json().await?)
    }

    async fn refund(&self, provider_ref: &str, amount_cents: i64) -> Result<(), ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/refunds", self.base_url))
            .bearer_auth(&self.secret)
            .json(&serde_json::json!({
                "provider_ref": provider_ref,
                "amount_cents": amount_cents,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Declined(format!("{}: {}", status, body)));
        }

        Ok(())
    }
}

/// In-process stand-in used when no processor is configured
///
/// Every checkout succeeds immediately and points at a local sandbox
/// page, so the rest of the flow (webhooks included) can be exercised
/// end to end in development.
pub struct SandboxProvider {
    base_url: String,
}

impl SandboxProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PaymentProvider for SandboxProvider {
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, ProviderError> {
        let provider_ref = format!("sandbox_{}", Uuid::new_v4());
        info!(
            "Sandbox checkout {} created for payment {} ({} cents)",
            provider_ref, request.payment_id, request.amount_cents
        );

        Ok(CheckoutSession {
            url: format!("{}/sandbox/checkout/{}", self.base_url, provider_ref),
            provider_ref,
        })
    }

    async fn refund(&self, provider_ref: &str, amount_cents: i64) -> Result<(), ProviderError> {
        info!(
            "Sandbox refund of {} cents issued for {}",
            amount_cents, provider_ref
        );
        Ok(())
    }
}
