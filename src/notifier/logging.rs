use crate::model::{NotifyError, Product};
use crate::notifier::{Message, NotificationDispatcher};
use crate::utils::mask_email;
use tracing::info;

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for LogNotifier {
    async fn send(&self, email: &str, product: &Product) -> Result<(), NotifyError> {
        let message = Message::for_product(product);
        info!(
            "✉️ [dry-run] to={} subject={:?}\n{}",
            mask_email(email),
            message.subject,
            message.body
        );
        Ok(())
    }
}
