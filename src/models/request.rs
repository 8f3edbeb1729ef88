use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map;

/// Lifecycle status of a request.
///
/// The wire names ("Save Offered" etc.) are shared with the dashboard and
/// the persisted documents, so they must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Canceled,
    Declined,
    #[serde(rename = "Save Offered")]
    SaveOffered,
    #[serde(rename = "Save Accepted")]
    SaveAccepted,
    #[serde(rename = "Save Declined")]
    SaveDeclined,
    #[serde(rename = "Save Confirmed")]
    SaveConfirmed,
}

impl RequestStatus {
    /// Every status, in dashboard display order. Status histograms are
    /// pre-populated from this list so reports always carry every key.
    pub const ALL: &'static [RequestStatus] = &[
        RequestStatus::Pending,
        RequestStatus::Canceled,
        RequestStatus::Declined,
        RequestStatus::SaveOffered,
        RequestStatus::SaveAccepted,
        RequestStatus::SaveDeclined,
        RequestStatus::SaveConfirmed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Canceled => "Canceled",
            RequestStatus::Declined => "Declined",
            RequestStatus::SaveOffered => "Save Offered",
            RequestStatus::SaveAccepted => "Save Accepted",
            RequestStatus::SaveDeclined => "Save Declined",
            RequestStatus::SaveConfirmed => "Save Confirmed",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Cancellation,
    Discount,
}

/// Snapshot of a save offer as extended to (and answered by) the customer.
/// All fields are optional: the snapshot accretes dates as the offer moves
/// through its own lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOffer {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date_offered: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_accepted: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_declined: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_confirmed: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclineReason {
    pub field: String,
    pub value: String,
}

/// A unit of work routed from a proxy tenant to a provider tenant on behalf
/// of an end customer. Never physically deleted in normal operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: String,
    /// Monotonic schema version of the persisted shape.
    pub version: i64,
    pub status: RequestStatus,
    pub request_type: RequestType,
    pub submitted_by: String,
    pub date_submitted: Option<DateTime<Utc>>,
    pub date_responded: Option<DateTime<Utc>>,
    pub proxy_tenant_id: String,
    pub provider_tenant_id: String,
    /// Customer-identifying fields; schema-free, each provider demands its
    /// own set via `Tenant::required_customer_info`.
    #[serde(default)]
    pub customer_info: Map<String, serde_json::Value>,
    #[serde(default)]
    pub save_offer: Option<SaveOffer>,
    #[serde(default)]
    pub decline_reason: Option<Vec<DeclineReason>>,
    #[serde(default)]
    pub notes: Option<String>,
    /// 1:1 reference to this request's audit log.
    pub log_id: String,
}

/// API payload for creating a request. The submitter and proxy tenant come
/// from the authenticated actor, not the payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
    pub request_type: RequestType,
    pub provider_tenant_id: String,
    #[serde(default)]
    pub customer_info: Map<String, serde_json::Value>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names_round_trip() {
        for status in RequestStatus::ALL {
            let encoded = serde_json::to_value(status).unwrap();
            assert_eq!(encoded, serde_json::Value::String(status.as_str().into()));
            let decoded: RequestStatus = serde_json::from_value(encoded).unwrap();
            assert_eq!(decoded, *status);
        }
    }

    #[test]
    fn request_serializes_camel_case() {
        let request = Request {
            id: "r1".into(),
            version: 1,
            status: RequestStatus::Pending,
            request_type: RequestType::Cancellation,
            submitted_by: "agent@proxy.example".into(),
            date_submitted: None,
            date_responded: None,
            proxy_tenant_id: "p1".into(),
            provider_tenant_id: "v1".into(),
            customer_info: Map::new(),
            save_offer: None,
            decline_reason: None,
            notes: None,
            log_id: "l1".into(),
        };
        let doc = serde_json::to_value(&request).unwrap();
        assert!(doc.get("proxyTenantId").is_some());
        assert!(doc.get("logId").is_some());
        assert!(doc.get("dateSubmitted").is_some());
        assert_eq!(doc["status"], "Pending");
    }
}
