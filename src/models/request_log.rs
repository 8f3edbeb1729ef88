use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::tenant::TenantType;

/// The acting identity stamped onto every appended change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedBy {
    pub email: String,
    pub tenant_type: TenantType,
    pub tenant_id: String,
}

/// One field-level delta in the append-only log. Immutable once appended;
/// list order is append order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestChange {
    /// Dotted path, e.g. `customerInfo.customerEmail` or `status`.
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
    pub changed_by: ChangedBy,
    /// Epoch milliseconds. All changes appended in one call share a stamp.
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartyAverage {
    pub ms: f64,
    pub hours: f64,
}

/// Per-party average elapsed time between consecutive status transitions,
/// attributed to the party that made the later transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AvgResponseTime {
    pub provider: PartyAverage,
    pub proxy: PartyAverage,
}

/// The audit trail and derived response-time metric owned 1:1 by a request.
/// Created with the request, never deleted while the request exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLog {
    pub request_id: String,
    pub changes: Vec<RequestChange>,
    /// Derived; recomputed over the full change list on every append.
    #[serde(default)]
    pub avg_response_time: AvgResponseTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn log_serializes_camel_case() {
        let log = RequestLog {
            request_id: "r1".into(),
            changes: vec![RequestChange {
                field: "status".into(),
                old_value: Value::Null,
                new_value: json!("Pending"),
                changed_by: ChangedBy {
                    email: "agent@proxy.example".into(),
                    tenant_type: TenantType::Proxy,
                    tenant_id: "p1".into(),
                },
                updated_at: 1_700_000_000_000,
            }],
            avg_response_time: AvgResponseTime::default(),
        };

        let doc = serde_json::to_value(&log).unwrap();
        assert_eq!(doc["requestId"], "r1");
        assert_eq!(doc["changes"][0]["oldValue"], Value::Null);
        assert_eq!(doc["changes"][0]["changedBy"]["tenantType"], "proxy");
        assert_eq!(doc["changes"][0]["updatedAt"], 1_700_000_000_000i64);
        assert_eq!(doc["avgResponseTime"]["provider"]["ms"], 0.0);
    }
}
