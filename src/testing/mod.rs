use serde_json::{json, Map, Value};

use crate::middleware::auth::ActorContext;
use crate::models::{
    ChangedBy, Request, RequestChange, RequestStatus, RequestType, SaveOfferTemplate, Tenant,
    TenantType,
};

/// A pending cancellation request with no customer info or offer attached.
pub fn request_fixture(id: &str) -> Request {
    Request {
        id: id.to_string(),
        version: 1,
        status: RequestStatus::Pending,
        request_type: RequestType::Cancellation,
        submitted_by: "agent@proxyco.example".to_string(),
        date_submitted: None,
        date_responded: None,
        proxy_tenant_id: "p1".to_string(),
        provider_tenant_id: "v1".to_string(),
        customer_info: Map::new(),
        save_offer: None,
        decline_reason: None,
        notes: None,
        log_id: format!("log-{id}"),
    }
}

pub fn tenant_fixture(id: &str, tenant_type: TenantType) -> Tenant {
    Tenant {
        id: id.to_string(),
        name: format!("Tenant {id}"),
        tenant_type,
        active: true,
        required_customer_info: match tenant_type {
            TenantType::Provider => vec!["customerEmail".to_string()],
            _ => vec![],
        },
        save_offers: match tenant_type {
            TenantType::Provider => vec![SaveOfferTemplate {
                id: "offer-1".to_string(),
                title: "20% off for 3 months".to_string(),
            }],
            _ => vec![],
        },
        admins: vec![format!("admin@{id}.example")],
    }
}

pub fn actor(tenant_type: TenantType, tenant_id: &str) -> ActorContext {
    ActorContext {
        email: format!("agent@{tenant_id}.example"),
        tenant_type,
        tenant_id: tenant_id.to_string(),
    }
}

/// A status transition in the audit log, attributed to the given party.
pub fn status_change(status: &str, tenant_type: TenantType, updated_at: i64) -> RequestChange {
    RequestChange {
        field: "status".to_string(),
        old_value: Value::Null,
        new_value: json!(status),
        changed_by: ChangedBy {
            email: format!("agent@{tenant_type:?}.example").to_lowercase(),
            tenant_type,
            tenant_id: match tenant_type {
                TenantType::Proxy => "p1".to_string(),
                TenantType::Provider => "v1".to_string(),
                TenantType::Management => "m1".to_string(),
            },
        },
        updated_at,
    }
}
