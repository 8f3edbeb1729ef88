use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use crate::middleware::auth::ActorContext;
use crate::models::{AvgResponseTime, ChangedBy, RequestChange, RequestLog, RequestStatus, TenantType};
use crate::models::Request;
use crate::services::change_detector::ChangeDraft;
use crate::services::response_time::average_response_time;
use crate::services::ServiceError;
use crate::store::{collections, Collection, DocumentStore};

/// Owns the append-only per-request change log.
#[derive(Clone)]
pub struct RequestLogService {
    logs: Collection<RequestLog>,
}

impl RequestLogService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            logs: Collection::new(store, collections::REQUEST_LOGS),
        }
    }

    /// Create the log for a freshly created request, seeded with the
    /// synthetic `status: null -> Pending` change attributed to the
    /// submitting proxy actor.
    pub async fn create_log(&self, request: &Request) -> Result<RequestLog, ServiceError> {
        let log = RequestLog {
            request_id: request.id.clone(),
            changes: vec![RequestChange {
                field: "status".to_string(),
                old_value: Value::Null,
                new_value: serde_json::to_value(RequestStatus::Pending)
                    .map_err(crate::store::StoreError::from)?,
                changed_by: ChangedBy {
                    email: request.submitted_by.clone(),
                    tenant_type: TenantType::Proxy,
                    tenant_id: request.proxy_tenant_id.clone(),
                },
                updated_at: Utc::now().timestamp_millis(),
            }],
            avg_response_time: AvgResponseTime::default(),
        };

        self.logs.set(&request.log_id, &log).await?;
        Ok(log)
    }

    /// Append detected deltas to a log, stamping each with the acting
    /// identity and one shared timestamp, then recompute the response-time
    /// summary over the entire resulting history and persist.
    ///
    /// The write is a compare-and-swap on the log's storage revision, so a
    /// concurrent append to the same log surfaces as a conflict instead of
    /// silently dropping changes.
    pub async fn append_changes(
        &self,
        log_id: &str,
        changes: Vec<ChangeDraft>,
        actor: Option<&ActorContext>,
    ) -> Result<RequestLog, ServiceError> {
        let actor = actor.ok_or_else(|| {
            ServiceError::Unauthorized("request log updates require an authenticated actor".into())
        })?;

        let (mut log, revision) = self
            .logs
            .get_versioned(log_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("request log {log_id} not found")))?;

        let stamped_at = Utc::now().timestamp_millis();
        let changed_by = actor.as_changed_by();
        for draft in changes {
            log.changes.push(RequestChange {
                field: draft.field,
                old_value: draft.old_value,
                new_value: draft.new_value,
                changed_by: changed_by.clone(),
                updated_at: stamped_at,
            });
        }

        log.avg_response_time = average_response_time(&log.changes);
        self.logs.set_versioned(log_id, &log, revision).await?;

        tracing::debug!(log_id, changes = log.changes.len(), "appended request changes");
        Ok(log)
    }

    pub async fn get_log(&self, log_id: &str) -> Result<Option<RequestLog>, ServiceError> {
        Ok(self.logs.get(log_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};
    use crate::testing::{actor, request_fixture};
    use serde_json::json;

    fn service() -> (Arc<MemoryStore>, RequestLogService) {
        let store = Arc::new(MemoryStore::new());
        let service = RequestLogService::new(store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn create_log_seeds_synthetic_pending_change() {
        let (_, service) = service();
        let request = request_fixture("r1");

        let log = service.create_log(&request).await.unwrap();
        assert_eq!(log.request_id, "r1");
        assert_eq!(log.changes.len(), 1);

        let seed = &log.changes[0];
        assert_eq!(seed.field, "status");
        assert_eq!(seed.old_value, Value::Null);
        assert_eq!(seed.new_value, json!("Pending"));
        assert_eq!(seed.changed_by.email, request.submitted_by);
        assert_eq!(seed.changed_by.tenant_type, TenantType::Proxy);
        assert_eq!(log.avg_response_time, AvgResponseTime::default());
    }

    #[tokio::test]
    async fn append_requires_an_actor() {
        let (_, service) = service();
        let request = request_fixture("r1");
        service.create_log(&request).await.unwrap();

        let err = service
            .append_changes(&request.log_id, vec![], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn append_to_missing_log_is_not_found() {
        let (_, service) = service();
        let err = service
            .append_changes("ghost", vec![], Some(&actor(TenantType::Provider, "v1")))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn append_round_trips_and_recomputes_summary() {
        let (_, service) = service();
        let request = request_fixture("r1");
        service.create_log(&request).await.unwrap();

        let provider = actor(TenantType::Provider, "v1");
        let draft = ChangeDraft {
            field: "status".into(),
            old_value: json!("Pending"),
            new_value: json!("Save Offered"),
        };
        service
            .append_changes(&request.log_id, vec![draft.clone()], Some(&provider))
            .await
            .unwrap();

        let log = service.get_log(&request.log_id).await.unwrap().unwrap();
        assert_eq!(log.changes.len(), 2);

        let appended = log.changes.last().unwrap();
        assert_eq!(appended.field, draft.field);
        assert_eq!(appended.old_value, draft.old_value);
        assert_eq!(appended.new_value, draft.new_value);
        assert_eq!(appended.changed_by.tenant_id, "v1");
        assert!(appended.updated_at >= log.changes[0].updated_at);

        // Summary covers the full history, not just the newest append
        let expected = average_response_time(&log.changes);
        assert_eq!(log.avg_response_time, expected);
    }

    #[tokio::test]
    async fn changes_in_one_append_share_a_timestamp() {
        let (_, service) = service();
        let request = request_fixture("r1");
        service.create_log(&request).await.unwrap();

        let drafts = vec![
            ChangeDraft {
                field: "customerInfo.customerEmail".into(),
                old_value: Value::Null,
                new_value: json!("jordan@example.com"),
            },
            ChangeDraft {
                field: "notes".into(),
                old_value: Value::Null,
                new_value: json!("verified account"),
            },
        ];
        let log = service
            .append_changes(&request.log_id, drafts, Some(&actor(TenantType::Proxy, "p1")))
            .await
            .unwrap();

        let appended = &log.changes[1..];
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[0].updated_at, appended[1].updated_at);
    }

    #[tokio::test]
    async fn concurrent_append_loses_with_conflict() {
        let (store, service) = service();
        let request = request_fixture("r1");
        service.create_log(&request).await.unwrap();

        // Simulate a competing writer bumping the revision between this
        // append's read and write
        let (doc, revision) = store
            .get_versioned(collections::REQUEST_LOGS, &request.log_id)
            .await
            .unwrap()
            .unwrap();
        store
            .set_versioned(collections::REQUEST_LOGS, &request.log_id, doc.clone(), revision)
            .await
            .unwrap();

        // Now race the stale revision directly at the store layer
        let err = store
            .set_versioned(collections::REQUEST_LOGS, &request.log_id, doc, revision)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
