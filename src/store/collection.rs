use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::store::filter::Filter;
use crate::store::{DocumentStore, StoreError};

/// Typed view over one collection of the document store.
pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    name: &'static str,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            name: self.name,
            _phantom: PhantomData,
        }
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(store: Arc<dyn DocumentStore>, name: &'static str) -> Self {
        Self {
            store,
            name,
            _phantom: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.store
            .get(self.name, id)
            .await?
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .transpose()
    }

    pub async fn get_all(&self) -> Result<Vec<T>, StoreError> {
        self.store
            .get_all(self.name)
            .await?
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .collect()
    }

    pub async fn query(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        self.store
            .query(self.name, filter)
            .await?
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .collect()
    }

    pub async fn set(&self, id: &str, doc: &T) -> Result<(), StoreError> {
        self.store
            .set(self.name, id, serde_json::to_value(doc)?)
            .await
    }

    pub async fn update(&self, id: &str, patch: &Map<String, Value>) -> Result<(), StoreError> {
        self.store.update(self.name, id, patch).await
    }

    pub async fn get_versioned(&self, id: &str) -> Result<Option<(T, i64)>, StoreError> {
        self.store
            .get_versioned(self.name, id)
            .await?
            .map(|(doc, revision)| {
                serde_json::from_value(doc)
                    .map(|typed| (typed, revision))
                    .map_err(StoreError::from)
            })
            .transpose()
    }

    pub async fn set_versioned(&self, id: &str, doc: &T, expected: i64) -> Result<(), StoreError> {
        self.store
            .set_versioned(self.name, id, serde_json::to_value(doc)?, expected)
            .await
    }
}
