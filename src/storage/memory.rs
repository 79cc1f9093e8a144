use crate::matcher::filters::category_compatible;
use crate::model::{NewRequest, Request, RequestStatus, StorageError};
use crate::storage::RequestStore;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    requests: BTreeMap<i64, Request>,
}

/// In-process request store with the same versioning rules as the SQLite one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RequestStore for MemoryStore {
    async fn insert(&self, draft: NewRequest) -> Result<Request, StorageError> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let request = Request::from_new(inner.next_id, draft, Utc::now());
        inner.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn save(&self, request: &Request) -> Result<u64, StorageError> {
        let mut inner = self.inner.lock().await;
        let stored = inner
            .requests
            .get_mut(&request.id)
            .ok_or(StorageError::NotFound(request.id))?;
        if stored.version != request.version {
            return Err(StorageError::VersionConflict {
                id: request.id,
                expected: request.version,
            });
        }
        let version = request.version + 1;
        *stored = Request {
            version,
            ..request.clone()
        };
        Ok(version)
    }

    async fn get(&self, id: i64) -> Result<Option<Request>, StorageError> {
        Ok(self.inner.lock().await.requests.get(&id).cloned())
    }

    async fn list(&self, status: Option<RequestStatus>) -> Result<Vec<Request>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .requests
            .values()
            .rev()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect())
    }

    async fn find_candidates(&self, product_category: &str) -> Result<Vec<Request>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .requests
            .values()
            .filter(|r| !r.is_closed() && r.status == RequestStatus::Active)
            .filter(|r| category_compatible(r.parsed_tags.category.as_deref(), product_category))
            .cloned()
            .collect())
    }
}
