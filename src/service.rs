// WatchService: request intake and the product-saved hook
use crate::matcher::{MatchEngine, MatchReport};
use crate::model::{MatchError, NewRequest, Product, Request, RequestStatus, StorageError};
use crate::parser::{Parser, QueryParser};
use crate::storage::RequestStore;
use crate::utils::mask_email;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Match(#[from] MatchError),
}

pub struct WatchService {
    parser: Arc<QueryParser>,
    store: Arc<dyn RequestStore>,
    engine: MatchEngine,
}

impl WatchService {
    pub fn new(parser: Arc<QueryParser>, store: Arc<dyn RequestStore>, engine: MatchEngine) -> Self {
        Self {
            parser,
            store,
            engine,
        }
    }

    /// Parses the text and stores a new ACTIVE request for the user.
    pub async fn create_request(&self, email: &str, query: &str) -> Result<Request, ServiceError> {
        let email = email.trim();
        let query = query.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ServiceError::InvalidRequest(format!(
                "'{}' is not an e-mail address",
                email
            )));
        }
        if query.is_empty() {
            return Err(ServiceError::InvalidRequest("query is empty".into()));
        }

        let parsed_tags = self.parser.parse(query);
        let request = self
            .store
            .insert(NewRequest {
                user_email: email.to_string(),
                natural_language_query: query.to_string(),
                parsed_tags,
            })
            .await?;
        info!(
            "📝 Stored request {} for {} (category: {:?})",
            request.id,
            mask_email(email),
            request.parsed_tags.category
        );
        Ok(request)
    }

    /// Runs after a product is created or updated: loads compatible open
    /// requests and lets the engine notify and update them.
    pub async fn on_product_saved(&self, product: &Product) -> Result<MatchReport, ServiceError> {
        product.validate()?;
        let candidates = self.store.find_candidates(&product.category).await?;
        info!(
            "Found {} candidate requests for product: {}",
            candidates.len(),
            product.title
        );
        Ok(self.engine.evaluate(product, candidates).await?)
    }

    pub async fn requests(&self, status: Option<RequestStatus>) -> Result<Vec<Request>, ServiceError> {
        Ok(self.store.list(status).await?)
    }
}
