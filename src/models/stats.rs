use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::tenant::TenantType;

/// Query payload for the stats endpoint. `tenant_type` and `tenant_id` are
/// required; the rest narrow the report. `source_id` drills down into a
/// single proxy source and is only meaningful from the provider viewpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsQuery {
    pub tenant_type: Option<TenantType>,
    pub tenant_id: Option<String>,
    /// Inclusive lower bound on `dateSubmitted`; `yyyy-MM-dd` or RFC 3339.
    pub from_date: Option<String>,
    /// Inclusive upper bound on `dateSubmitted`; `yyyy-MM-dd` or RFC 3339.
    pub to_date: Option<String>,
    pub source_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOfferCounts {
    pub offered: u64,
    pub accepted: u64,
    pub declined: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantRef {
    pub id: String,
    pub name: String,
}

/// Aggregated request metrics for one tenant viewpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStats {
    pub total_count: u64,
    /// Always carries every status key, even at zero.
    pub status_counts: BTreeMap<String, u64>,
    /// Tenant-level KPI in days, rounded to one decimal. Distinct from the
    /// per-party hours metric on each request log.
    pub average_response_time: f64,
    /// Submissions per calendar day, keyed `yyyy-MM-dd`, over the computed
    /// window ending today.
    pub daily_volume: BTreeMap<String, u64>,
    /// Requests per proxy source tenant.
    pub source_distribution: BTreeMap<String, u64>,
    pub save_offer_counts: SaveOfferCounts,
}

/// The full report returned by the stats endpoint. Regenerated on demand;
/// never persisted or cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub requests: RequestStats,
    pub tenants: Vec<TenantRef>,
}
