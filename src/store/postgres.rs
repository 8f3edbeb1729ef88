use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::time::Duration;

use crate::store::filter::{Condition, Filter};
use crate::store::{DocumentStore, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id         TEXT NOT NULL,
    doc        JSONB NOT NULL,
    revision   BIGINT NOT NULL DEFAULT 0,
    PRIMARY KEY (collection, id)
)
"#;

/// PostgreSQL-backed document store. Documents live in a single JSONB table
/// keyed by (collection, id) with a storage-level revision counter backing
/// the versioned write path.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        connection_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connection_timeout)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the documents table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Text representation of a JSON scalar for `doc->>field` comparisons.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_rfc3339(value: &Value) -> bool {
    value
        .as_str()
        .map(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok())
        .unwrap_or(false)
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query("SELECT doc FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_get::<Value, _>("doc"))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn get_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let rows = sqlx::query("SELECT doc FROM documents WHERE collection = $1 ORDER BY id")
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|r| r.try_get::<Value, _>("doc").map_err(StoreError::from))
            .collect()
    }

    async fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let mut sql = String::from("SELECT doc FROM documents WHERE collection = $1");
        let mut params: Vec<String> = Vec::new();
        let mut next = 2;

        for condition in filter.conditions() {
            match condition {
                Condition::Eq { field, value } => {
                    sql.push_str(&format!(" AND doc->>(${}::text) = ${}", next, next + 1));
                    params.push(field.clone());
                    params.push(scalar_text(value));
                }
                Condition::Gte { field, value } if is_rfc3339(value) => {
                    sql.push_str(&format!(
                        " AND (doc->>(${}::text))::timestamptz >= (${})::timestamptz",
                        next,
                        next + 1
                    ));
                    params.push(field.clone());
                    params.push(scalar_text(value));
                }
                Condition::Gte { field, value } => {
                    sql.push_str(&format!(" AND doc->>(${}::text) >= ${}", next, next + 1));
                    params.push(field.clone());
                    params.push(scalar_text(value));
                }
                Condition::Lte { field, value } if is_rfc3339(value) => {
                    sql.push_str(&format!(
                        " AND (doc->>(${}::text))::timestamptz <= (${})::timestamptz",
                        next,
                        next + 1
                    ));
                    params.push(field.clone());
                    params.push(scalar_text(value));
                }
                Condition::Lte { field, value } => {
                    sql.push_str(&format!(" AND doc->>(${}::text) <= ${}", next, next + 1));
                    params.push(field.clone());
                    params.push(scalar_text(value));
                }
            }
            next += 2;
        }
        sql.push_str(" ORDER BY id");

        let mut query = sqlx::query(&sql).bind(collection);
        for param in &params {
            query = query.bind(param);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| r.try_get::<Value, _>("doc").map_err(StoreError::from))
            .collect()
    }

    async fn set(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO documents (collection, id, doc, revision) VALUES ($1, $2, $3, 0) \
             ON CONFLICT (collection, id) \
             DO UPDATE SET doc = EXCLUDED.doc, revision = documents.revision + 1",
        )
        .bind(collection)
        .bind(id)
        .bind(doc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE documents SET doc = doc || $3, revision = revision + 1 \
             WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .bind(Value::Object(patch.clone()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("{collection}/{id}")));
        }
        Ok(())
    }

    async fn get_versioned(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<(Value, i64)>, StoreError> {
        let row =
            sqlx::query("SELECT doc, revision FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| {
            let doc = r.try_get::<Value, _>("doc")?;
            let revision = r.try_get::<i64, _>("revision")?;
            Ok::<_, sqlx::Error>((doc, revision))
        })
        .transpose()
        .map_err(StoreError::from)
    }

    async fn set_versioned(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
        expected: i64,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE documents SET doc = $3, revision = revision + 1 \
             WHERE collection = $1 AND id = $2 AND revision = $4",
        )
        .bind(collection)
        .bind(id)
        .bind(doc)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish a missing document from a lost race
            let exists =
                sqlx::query("SELECT 1 AS one FROM documents WHERE collection = $1 AND id = $2")
                    .bind(collection)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
                    .is_some();
            return if exists {
                Err(StoreError::Conflict(format!(
                    "{collection}/{id}: revision {expected} is stale"
                )))
            } else {
                Err(StoreError::NotFound(format!("{collection}/{id}")))
            };
        }
        Ok(())
    }
}
