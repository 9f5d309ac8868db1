//! Outbound notification seam
//!
//! Offers, registrations, and messages generate notifications to the
//! affected member. Delivery rides on an external mail bridge; a
//! delivery failure is logged and swallowed, never surfaced to the
//! request that triggered it.

use async_trait::async_trait;
use tracing::{debug, warn};

/// Delivers notifications to members
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends one notification. Implementations handle their own
    /// failures; this never reports one.
    async fn notify(&self, recipient_email: &str, subject: &str, body: &str);
}

/// POSTs notifications to the configured mail bridge
pub struct HttpNotifier {
    client: reqwest::Client,
    notify_url: String,
}

impl HttpNotifier {
    pub fn new(notify_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            notify_url: notify_url.into(),
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, recipient_email: &str, subject: &str, body: &str) {
        let payload = serde_json::json!({
            "to": recipient_email,
            "subject": subject,
            "body": body,
        });

        match self.client.post(&self.notify_url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Notified {}: {}", recipient_email, subject);
            }
            Ok(response) => {
                warn!(
                    "Mail bridge returned {} for notification to {}",
                    response.status(),
                    recipient_email
                );
            }
            Err(err) => {
                warn!("Failed to reach mail bridge: {}", err);
            }
        }
    }
}

/// Discards notifications, for deployments without a mail bridge
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, recipient_email: &str, subject: &str, _body: &str) {
        debug!("Dropping notification to {}: {}", recipient_email, subject);
    }
}
