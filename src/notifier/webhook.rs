// notifier/webhook.rs

use crate::config::NotifierConfig;
use crate::model::{NotifyError, Product};
use crate::notifier::{Message, NotificationDispatcher};
use crate::utils::mask_email;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct OutgoingMail<'a> {
    to: &'a str,
    from_name: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Posts notification mails as JSON to a mail relay endpoint.
pub struct WebhookNotifier {
    pub url: String,
    pub sender_name: String,
    pub client: Client,
    pub timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(url: String, config: &NotifierConfig) -> Result<Self, NotifyError> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::ApiError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            url,
            sender_name: config.sender_name.clone(),
            client,
            timeout,
        })
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for WebhookNotifier {
    async fn send(&self, email: &str, product: &Product) -> Result<(), NotifyError> {
        let message = Message::for_product(product);
        let mail = OutgoingMail {
            to: email,
            from_name: &self.sender_name,
            subject: &message.subject,
            body: &message.body,
        };
        info!(
            "📤 Sending notification to {} for product {}",
            mask_email(email),
            product.id
        );

        let response = match timeout(self.timeout, self.client.post(&self.url).json(&mail).send()).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                warn!("❌ Mail relay request failed: {:?}", e);
                return Err(NotifyError::ApiError(format!("Send failed: {}", e)));
            }
            Err(_) => {
                warn!("⏳ Mail relay request timed out");
                return Err(NotifyError::Unreachable);
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| "unknown".into());
        if !status.is_success() {
            warn!("❌ Mail relay responded [{}]: {}", status, body);
            return Err(NotifyError::ApiError(format!("relay returned {}", status)));
        }
        info!("✅ Mail relay response [{}]", status);
        Ok(())
    }
}
