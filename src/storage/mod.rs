pub mod memory;
pub mod sqlite;

use crate::model::{NewRequest, Request, RequestStatus, StorageError};

pub use memory::MemoryStore;
pub use sqlite::{SqliteStorage, SqliteStore};

/// Persistence capability for requests. Writes are per request; there is no
/// transaction spanning several requests.
#[async_trait::async_trait]
pub trait RequestStore: Send + Sync {
    /// Stores a new ACTIVE request and returns it with its id.
    async fn insert(&self, draft: NewRequest) -> Result<Request, StorageError>;

    /// Writes back a request if nobody else did since it was read
    /// (`request.version` must match the stored one). Returns the new version.
    async fn save(&self, request: &Request) -> Result<u64, StorageError>;

    async fn get(&self, id: i64) -> Result<Option<Request>, StorageError>;

    /// All requests, or only those with the given status, newest first.
    async fn list(&self, status: Option<RequestStatus>) -> Result<Vec<Request>, StorageError>;

    /// ACTIVE, unfulfilled requests whose category is compatible with the product's.
    async fn find_candidates(&self, product_category: &str) -> Result<Vec<Request>, StorageError>;
}
