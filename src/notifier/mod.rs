pub mod logging;
pub mod webhook;

use crate::model::{NotifyError, Product};

pub use logging::LogNotifier;
pub use webhook::WebhookNotifier;

/// Delivers a "your product is here" message to a user.
#[async_trait::async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, email: &str, product: &Product) -> Result<(), NotifyError>;
}

/// Subject and body of a product notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub body: String,
}

impl Message {
    pub fn for_product(product: &Product) -> Self {
        let price = product
            .price
            .map(|p| format!("₹{:.2}", p))
            .unwrap_or_else(|| "n/a".into());
        let mut body = format!(
            "Good news! A product matching your request is now listed.\n\n📦 {}\n🏷 Category: {}\n💰 Price: {}",
            product.title, product.category, price
        );
        if let Some(platform) = &product.platform {
            body.push_str(&format!("\n🛒 Platform: {}", platform));
        }
        if let Some(link) = &product.link {
            body.push_str(&format!("\n🔗 Link: {}", link));
        }
        Self {
            subject: format!("Found a match: {}", product.title),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_mentions_product_details() {
        let product = Product {
            id: "p1".into(),
            title: "Dell XPS 13".into(),
            category: "Laptops".into(),
            price: Some(58_999.0),
            platform: Some("AMAZON".into()),
            link: Some("https://amzn.to/xyz".into()),
        };
        let msg = Message::for_product(&product);
        assert_eq!(msg.subject, "Found a match: Dell XPS 13");
        assert!(msg.body.contains("₹58999.00"));
        assert!(msg.body.contains("AMAZON"));
        assert!(msg.body.contains("https://amzn.to/xyz"));
    }
}
