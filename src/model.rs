// Core structs: ParsedQuery, Request, Product and the error types shared across modules
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured criteria extracted from a free-text request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedQuery {
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub min_price: u64,
    pub max_price: Option<u64>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub original_query: String,
}

impl ParsedQuery {
    pub fn new(original_query: &str) -> Self {
        Self {
            original_query: original_query.to_string(),
            ..Self::default()
        }
    }

    /// Pushes a tag unless it is already present, keeping first-seen order.
    pub fn push_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Active,
    Fulfilled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Active => "ACTIVE",
            RequestStatus::Fulfilled => "FULFILLED",
        }
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(RequestStatus::Active),
            "FULFILLED" => Ok(RequestStatus::Fulfilled),
            other => Err(format!("unknown request status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub product_id: String,
    pub sent_at: DateTime<Utc>,
}

/// A request that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub user_email: String,
    pub natural_language_query: String,
    pub parsed_tags: ParsedQuery,
}

/// An outstanding purchase request, mutated by the matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: i64,
    pub user_email: String,
    pub natural_language_query: String,
    pub parsed_tags: ParsedQuery,
    pub matched_products: Vec<String>,
    pub notifications_sent: Vec<NotificationRecord>,
    pub is_fulfilled: bool,
    pub status: RequestStatus,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped by the store on every write.
    pub version: u64,
}

impl Request {
    pub fn from_new(id: i64, draft: NewRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_email: draft.user_email,
            natural_language_query: draft.natural_language_query,
            parsed_tags: draft.parsed_tags,
            matched_products: Vec::new(),
            notifications_sent: Vec::new(),
            is_fulfilled: false,
            status: RequestStatus::Active,
            fulfilled_at: None,
            created_at,
            version: 0,
        }
    }

    /// Terminal for notification purposes.
    pub fn is_closed(&self) -> bool {
        self.is_fulfilled || self.status == RequestStatus::Fulfilled
    }

    pub fn has_matched(&self, product_id: &str) -> bool {
        self.matched_products.iter().any(|id| id == product_id)
    }

    /// Records a dispatch attempt for a product. The id is added to
    /// `matched_products` only once; every call appends to the history.
    pub fn record_match(&mut self, product_id: &str, at: DateTime<Utc>) {
        if !self.has_matched(product_id) {
            self.matched_products.push(product_id.to_string());
        }
        self.notifications_sent.push(NotificationRecord {
            product_id: product_id.to_string(),
            sent_at: at,
        });
    }

    /// Moves the request to FULFILLED. Returns false if it already was.
    pub fn mark_fulfilled(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_closed() {
            return false;
        }
        self.is_fulfilled = true;
        self.status = RequestStatus::Fulfilled;
        self.fulfilled_at = Some(at);
        true
    }

    /// Product whose match closed the request.
    pub fn fulfilled_by(&self) -> Option<&str> {
        if !self.is_closed() {
            return None;
        }
        self.matched_products.last().map(String::as_str)
    }
}

/// A listed product. Read-only to the matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    pub price: Option<f64>,
    pub platform: Option<String>,
    #[serde(default, alias = "affiliateLink")]
    pub link: Option<String>,
}

impl Product {
    /// Checks the fields the matcher filters on.
    pub fn validate(&self) -> Result<f64, MatchError> {
        if self.id.trim().is_empty() {
            return Err(MatchError::InvalidProduct("product id is missing".into()));
        }
        if self.category.trim().is_empty() {
            return Err(MatchError::InvalidProduct(format!(
                "product {} has no category",
                self.id
            )));
        }
        match self.price {
            Some(price) if price.is_finite() && price >= 0.0 => Ok(price),
            Some(price) => Err(MatchError::InvalidProduct(format!(
                "product {} has an invalid price: {}",
                self.id, price
            ))),
            None => Err(MatchError::InvalidProduct(format!(
                "product {} has no price",
                self.id
            ))),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("request {0} not found")]
    NotFound(i64),
    #[error("request {id} was modified concurrently (expected version {expected})")]
    VersionConflict { id: i64, expected: u64 },
    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification API error: {0}")]
    ApiError(String),
    #[error("notification endpoint unreachable")]
    Unreachable,
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid product: {0}")]
    InvalidProduct(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request {
        Request::from_new(
            1,
            NewRequest {
                user_email: "a@b.c".into(),
                natural_language_query: "laptop".into(),
                parsed_tags: ParsedQuery::new("laptop"),
            },
            Utc::now(),
        )
    }

    #[test]
    fn record_match_keeps_ids_unique() {
        let mut req = request();
        let now = Utc::now();
        req.record_match("p1", now);
        req.record_match("p1", now);
        assert_eq!(req.matched_products, vec!["p1"]);
        assert_eq!(req.notifications_sent.len(), 2);
    }

    #[test]
    fn fulfillment_is_single_shot() {
        let mut req = request();
        let first = Utc::now();
        req.record_match("p9", first);
        assert!(req.mark_fulfilled(first));
        assert!(!req.mark_fulfilled(first + chrono::Duration::hours(1)));
        assert_eq!(req.fulfilled_at, Some(first));
        assert_eq!(req.fulfilled_by(), Some("p9"));
    }

    #[test]
    fn product_without_price_is_rejected() {
        let product = Product {
            id: "p1".into(),
            title: "Laptop".into(),
            category: "Laptops".into(),
            price: None,
            platform: None,
            link: None,
        };
        assert!(matches!(product.validate(), Err(MatchError::InvalidProduct(_))));
    }

    #[test]
    fn status_serializes_upper_case() {
        let json = serde_json::to_string(&RequestStatus::Fulfilled).unwrap();
        assert_eq!(json, "\"FULFILLED\"");
        assert_eq!("active".parse::<RequestStatus>(), Ok(RequestStatus::Active));
    }
}
