use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::store::filter::Filter;
use crate::store::{DocumentStore, StoreError};

type Documents = BTreeMap<String, (Value, i64)>;

/// In-memory document store used by tests and the demo serve mode. Keeps
/// the same revision semantics as the Postgres implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Documents>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Documents>> {
        self.collections.read().expect("memory store lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Documents>> {
        self.collections.write().expect("memory store lock poisoned")
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .read()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|(doc, _)| doc.clone()))
    }

    async fn get_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .read()
            .get(collection)
            .map(|docs| docs.values().map(|(doc, _)| doc.clone()).collect())
            .unwrap_or_default())
    }

    async fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .read()
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|(doc, _)| filter.matches(doc))
                    .map(|(doc, _)| doc.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn set(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        let mut collections = self.write();
        let docs = collections.entry(collection.to_string()).or_default();
        let revision = docs.get(id).map(|(_, rev)| rev + 1).unwrap_or(0);
        docs.insert(id.to_string(), (doc, revision));
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut collections = self.write();
        let entry = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))?;

        let target = entry
            .0
            .as_object_mut()
            .ok_or_else(|| StoreError::Query(format!("{collection}/{id} is not an object")))?;
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
        entry.1 += 1;
        Ok(())
    }

    async fn get_versioned(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<(Value, i64)>, StoreError> {
        Ok(self
            .read()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn set_versioned(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
        expected: i64,
    ) -> Result<(), StoreError> {
        let mut collections = self.write();
        let entry = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))?;

        if entry.1 != expected {
            return Err(StoreError::Conflict(format!(
                "{collection}/{id}: expected revision {expected}, found {}",
                entry.1
            )));
        }
        *entry = (doc, expected + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = MemoryStore::new();
        store
            .set("requests", "r1", json!({"id": "r1", "status": "Pending"}))
            .await
            .unwrap();
        let doc = store.get("requests", "r1").await.unwrap().unwrap();
        assert_eq!(doc["status"], "Pending");
        assert!(store.get("requests", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_merges_top_level_fields() {
        let store = MemoryStore::new();
        store
            .set("requests", "r1", json!({"id": "r1", "status": "Pending", "notes": null}))
            .await
            .unwrap();

        let mut patch = Map::new();
        patch.insert("status".into(), json!("Canceled"));
        store.update("requests", "r1", &patch).await.unwrap();

        let doc = store.get("requests", "r1").await.unwrap().unwrap();
        assert_eq!(doc["status"], "Canceled");
        assert_eq!(doc["id"], "r1");
    }

    #[tokio::test]
    async fn update_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update("requests", "ghost", &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn versioned_write_detects_races() {
        let store = MemoryStore::new();
        store.set("logs", "l1", json!({"changes": []})).await.unwrap();

        let (_, revision) = store.get_versioned("logs", "l1").await.unwrap().unwrap();
        store
            .set_versioned("logs", "l1", json!({"changes": [1]}), revision)
            .await
            .unwrap();

        // A second writer holding the stale revision must lose
        let err = store
            .set_versioned("logs", "l1", json!({"changes": [2]}), revision)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn query_applies_filter() {
        let store = MemoryStore::new();
        store
            .set("requests", "r1", json!({"proxyTenantId": "p1"}))
            .await
            .unwrap();
        store
            .set("requests", "r2", json!({"proxyTenantId": "p2"}))
            .await
            .unwrap();

        let hits = store
            .query("requests", &Filter::new().eq("proxyTenantId", "p1"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["proxyTenantId"], "p1");
    }
}
