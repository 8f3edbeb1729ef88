use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::middleware::auth::ActorContext;
use crate::models::{NewRequest, Request, RequestStatus};
use crate::services::change_detector::detect_changes;
use crate::services::log_service::RequestLogService;
use crate::services::ServiceError;
use crate::store::{collections, Collection, DocumentStore, Filter};

/// Request lifecycle: creation seeds the 1:1 audit log; updates flow
/// through change detection before touching the document or the log.
#[derive(Clone)]
pub struct RequestService {
    requests: Collection<Request>,
    logs: RequestLogService,
}

impl RequestService {
    pub fn new(store: Arc<dyn DocumentStore>, logs: RequestLogService) -> Self {
        Self {
            requests: Collection::new(store, collections::REQUESTS),
            logs,
        }
    }

    /// Create a request in `Pending` on behalf of the acting proxy user,
    /// then create its log. The two writes are ordered, not transactional:
    /// the store has no multi-document transactions.
    pub async fn create_request(
        &self,
        new: NewRequest,
        actor: Option<&ActorContext>,
    ) -> Result<Request, ServiceError> {
        let actor = actor.ok_or_else(|| {
            ServiceError::Unauthorized("request creation requires an authenticated actor".into())
        })?;

        let request = Request {
            id: Uuid::new_v4().to_string(),
            version: 1,
            status: RequestStatus::Pending,
            request_type: new.request_type,
            submitted_by: actor.email.clone(),
            date_submitted: Some(Utc::now()),
            date_responded: None,
            proxy_tenant_id: actor.tenant_id.clone(),
            provider_tenant_id: new.provider_tenant_id,
            customer_info: new.customer_info,
            save_offer: None,
            decline_reason: None,
            notes: new.notes,
            log_id: Uuid::new_v4().to_string(),
        };

        self.requests.set(&request.id, &request).await?;
        self.logs.create_log(&request).await?;

        tracing::info!(request_id = %request.id, proxy = %request.proxy_tenant_id, "request created");
        Ok(request)
    }

    pub async fn get_request(&self, id: &str) -> Result<Request, ServiceError> {
        self.requests
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("request {id} not found")))
    }

    /// Requests visible from the actor's side of the exchange.
    pub async fn list_for_actor(&self, actor: &ActorContext) -> Result<Vec<Request>, ServiceError> {
        let field = match actor.tenant_type {
            crate::models::TenantType::Proxy => "proxyTenantId",
            _ => "providerTenantId",
        };
        let filter = Filter::new().eq(field, actor.tenant_id.clone());
        Ok(self.requests.query(&filter).await?)
    }

    /// Apply a partial update: detect field-level deltas, merge the patch
    /// into the stored document, then append the deltas to the audit log.
    /// A patch that changes nothing writes nothing.
    pub async fn update_request(
        &self,
        id: &str,
        patch: Map<String, Value>,
        actor: Option<&ActorContext>,
    ) -> Result<Request, ServiceError> {
        let actor = actor.ok_or_else(|| {
            ServiceError::Unauthorized("request updates require an authenticated actor".into())
        })?;

        let current = self.get_request(id).await?;
        let changes = detect_changes(&current, &patch);
        if changes.is_empty() {
            return Ok(current);
        }

        self.requests.update(id, &patch).await?;
        self.logs
            .append_changes(&current.log_id, changes, Some(actor))
            .await?;

        self.get_request(id).await
    }

    pub async fn get_log_for_request(
        &self,
        id: &str,
    ) -> Result<crate::models::RequestLog, ServiceError> {
        let request = self.get_request(id).await?;
        self.logs
            .get_log(&request.log_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("log for request {id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RequestType, TenantType};
    use crate::store::MemoryStore;
    use crate::testing::actor;
    use serde_json::json;

    fn service() -> RequestService {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let logs = RequestLogService::new(store.clone());
        RequestService::new(store, logs)
    }

    fn new_request() -> NewRequest {
        serde_json::from_value(json!({
            "requestType": "Cancellation",
            "providerTenantId": "v1",
            "customerInfo": {"customerEmail": "jordan@example.com"},
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_seeds_request_and_log() {
        let service = service();
        let proxy = actor(TenantType::Proxy, "p1");

        let request = service.create_request(new_request(), Some(&proxy)).await.unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.request_type, RequestType::Cancellation);
        assert_eq!(request.proxy_tenant_id, "p1");
        assert_eq!(request.submitted_by, proxy.email);
        assert!(request.date_submitted.is_some());

        let log = service.get_log_for_request(&request.id).await.unwrap();
        assert_eq!(log.request_id, request.id);
        assert_eq!(log.changes.len(), 1);
    }

    #[tokio::test]
    async fn create_without_actor_is_unauthorized() {
        let service = service();
        let err = service.create_request(new_request(), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn update_merges_patch_and_appends_to_log() {
        let service = service();
        let proxy = actor(TenantType::Proxy, "p1");
        let provider = actor(TenantType::Provider, "v1");

        let request = service.create_request(new_request(), Some(&proxy)).await.unwrap();
        let patch = json!({"status": "Save Offered"})
            .as_object()
            .cloned()
            .unwrap();
        let updated = service
            .update_request(&request.id, patch, Some(&provider))
            .await
            .unwrap();
        assert_eq!(updated.status, RequestStatus::SaveOffered);

        let log = service.get_log_for_request(&request.id).await.unwrap();
        assert_eq!(log.changes.len(), 2);
        let last = log.changes.last().unwrap();
        assert_eq!(last.field, "status");
        assert_eq!(last.new_value, json!("Save Offered"));
        assert_eq!(last.changed_by.tenant_type, TenantType::Provider);
    }

    #[tokio::test]
    async fn noop_patch_leaves_log_untouched() {
        let service = service();
        let proxy = actor(TenantType::Proxy, "p1");

        let request = service.create_request(new_request(), Some(&proxy)).await.unwrap();
        let patch = json!({"status": "Pending"}).as_object().cloned().unwrap();
        service
            .update_request(&request.id, patch, Some(&proxy))
            .await
            .unwrap();

        let log = service.get_log_for_request(&request.id).await.unwrap();
        assert_eq!(log.changes.len(), 1);
    }

    #[tokio::test]
    async fn update_missing_request_is_not_found() {
        let service = service();
        let proxy = actor(TenantType::Proxy, "p1");
        let err = service
            .update_request("ghost", Map::new(), Some(&proxy))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn listing_scopes_to_the_actor_tenant() {
        let service = service();
        let proxy_a = actor(TenantType::Proxy, "pa");
        let proxy_b = actor(TenantType::Proxy, "pb");
        service.create_request(new_request(), Some(&proxy_a)).await.unwrap();
        service.create_request(new_request(), Some(&proxy_b)).await.unwrap();

        let visible = service.list_for_actor(&proxy_a).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].proxy_tenant_id, "pa");

        let provider = actor(TenantType::Provider, "v1");
        let provider_view = service.list_for_actor(&provider).await.unwrap();
        assert_eq!(provider_view.len(), 2);
    }
}
