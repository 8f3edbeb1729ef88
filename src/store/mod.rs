pub mod collection;
pub mod filter;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use collection::Collection;
pub use filter::{Condition, Filter};
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Write conflict: {0}")]
    Conflict(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Query error: {0}")]
    Query(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Collection-scoped document storage. The application treats this as an
/// opaque queryable store: per-document reads and writes are atomic, but
/// there are no multi-document transactions.
///
/// Implementations are constructed by the process entry point and injected
/// into services; nothing in the crate reaches for a global client.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    async fn get_all(&self, collection: &str) -> Result<Vec<Value>, StoreError>;

    async fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError>;

    /// Create or fully replace a document.
    async fn set(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError>;

    /// Merge `patch` into an existing document at the top level.
    /// Fails with `NotFound` when the document does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<(), StoreError>;

    /// Read a document together with its storage revision. The revision is
    /// storage metadata, not part of the document shape.
    async fn get_versioned(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<(Value, i64)>, StoreError>;

    /// Replace a document only if its revision still equals `expected`.
    /// Fails with `Conflict` when another writer got there first, and with
    /// `NotFound` when the document does not exist.
    async fn set_versioned(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
        expected: i64,
    ) -> Result<(), StoreError>;
}

/// Collection names used across the application.
pub mod collections {
    pub const REQUESTS: &str = "requests";
    pub const REQUEST_LOGS: &str = "requestLogs";
    pub const TENANTS: &str = "tenants";
}
