use std::sync::Arc;

use crate::models::Tenant;
use crate::services::{RequestLogService, RequestService, StatsService};
use crate::store::{collections, Collection, DocumentStore, MemoryStore};

/// Shared application state. The store client is constructed once by the
/// process entry point and threaded through here; services never reach for
/// globals.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub requests: RequestService,
    pub logs: RequestLogService,
    pub stats: StatsService,
    pub tenants: Collection<Tenant>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let logs = RequestLogService::new(store.clone());
        Self {
            requests: RequestService::new(store.clone(), logs.clone()),
            logs,
            stats: StatsService::new(store.clone()),
            tenants: Collection::new(store.clone(), collections::TENANTS),
            store,
        }
    }

    /// State over the in-memory store, for tests and demo serving.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}
