use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use futures::future;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::models::{
    Request, RequestLog, RequestStats, RequestStatus, SaveOfferCounts, StatsQuery, StatsResponse,
    Tenant, TenantRef, TenantType,
};
use crate::services::ServiceError;
use crate::store::{collections, Collection, DocumentStore, Filter};

const MS_PER_DAY: f64 = 86_400_000.0;
const DAY_KEY: &str = "%Y-%m-%d";

/// Computes the per-tenant statistics report consumed by the dashboard.
/// Reports are regenerated on demand; nothing here is cached or persisted.
#[derive(Clone)]
pub struct StatsService {
    requests: Collection<Request>,
    logs: Collection<RequestLog>,
    tenants: Collection<Tenant>,
}

impl StatsService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            requests: Collection::new(store.clone(), collections::REQUESTS),
            logs: Collection::new(store.clone(), collections::REQUEST_LOGS),
            tenants: Collection::new(store, collections::TENANTS),
        }
    }

    /// Produce a complete report for one tenant viewpoint, or an error;
    /// never a partial report. Argument validation happens before any I/O.
    pub async fn calculate_stats(&self, query: &StatsQuery) -> Result<StatsResponse, ServiceError> {
        let tenant_type = query
            .tenant_type
            .ok_or_else(|| ServiceError::InvalidArgument("tenantType is required".into()))?;
        let tenant_id = query
            .tenant_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ServiceError::InvalidArgument("tenantId is required".into()))?;

        let filter = build_request_filter(tenant_type, tenant_id, query)?;

        // Matching requests plus full log and tenant collections, fetched
        // concurrently. The three reads are not mutually isolated; the
        // report is a best-effort snapshot.
        let (requests, logs, tenants) = future::try_join3(
            self.requests.query(&filter),
            self.logs.get_all(),
            self.tenants.get_all(),
        )
        .await?;

        Ok(assemble(&requests, &logs, &tenants, Utc::now().date_naive()))
    }
}

fn build_request_filter(
    tenant_type: TenantType,
    tenant_id: &str,
    query: &StatsQuery,
) -> Result<Filter, ServiceError> {
    let mut filter = match tenant_type {
        TenantType::Proxy => Filter::new().eq("proxyTenantId", tenant_id),
        _ => Filter::new().eq("providerTenantId", tenant_id),
    };

    if let Some(from) = &query.from_date {
        filter = filter.gte("dateSubmitted", date_bound(from, false)?);
    }
    if let Some(to) = &query.to_date {
        filter = filter.lte("dateSubmitted", date_bound(to, true)?);
    }

    // Source drill-down is only meaningful from the provider viewpoint
    if tenant_type == TenantType::Provider {
        if let Some(source_id) = &query.source_id {
            filter = filter.eq("proxyTenantId", source_id.clone());
        }
    }

    Ok(filter)
}

/// Normalize a `yyyy-MM-dd` or RFC 3339 bound to an inclusive RFC 3339
/// instant: bare dates expand to the start or end of that day.
fn date_bound(raw: &str, end_of_day: bool) -> Result<String, ServiceError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, DAY_KEY) {
        let time = if end_of_day {
            date.and_hms_milli_opt(23, 59, 59, 999)
        } else {
            date.and_hms_opt(0, 0, 0)
        }
        .ok_or_else(|| ServiceError::InvalidArgument(format!("invalid date bound: {raw}")))?;
        return Ok(Utc.from_utc_datetime(&time).to_rfc3339());
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339())
        .map_err(|_| ServiceError::InvalidArgument(format!("invalid date bound: {raw}")))
}

/// Calendar days of the daily-volume chart, oldest first. The window runs
/// from the start of the current month through today; during the first
/// five days of a month it reaches back five extra days so the chart is
/// not nearly empty right after a month rolls over.
pub fn daily_volume_window(today: NaiveDate) -> Vec<NaiveDate> {
    let month_start = today.with_day(1).expect("day 1 exists in every month");
    let start = if today.day() <= 5 {
        month_start - Duration::days(5)
    } else {
        month_start
    };

    let mut days = Vec::new();
    let mut day = start;
    while day <= today {
        days.push(day);
        day += Duration::days(1);
    }
    days
}

fn assemble(
    requests: &[Request],
    logs: &[RequestLog],
    tenants: &[Tenant],
    today: NaiveDate,
) -> StatsResponse {
    let mut status_counts: BTreeMap<String, u64> = RequestStatus::ALL
        .iter()
        .map(|status| (status.as_str().to_string(), 0))
        .collect();

    let mut daily_volume: BTreeMap<String, u64> = daily_volume_window(today)
        .into_iter()
        .map(|day| (day.format(DAY_KEY).to_string(), 0))
        .collect();
    let thirty_days_ago = today - Duration::days(30);

    let logs_by_request: HashMap<&str, &RequestLog> = logs
        .iter()
        .map(|log| (log.request_id.as_str(), log))
        .collect();

    let mut source_distribution: BTreeMap<String, u64> = BTreeMap::new();
    let mut save_offer_counts = SaveOfferCounts::default();
    let mut response_days_sum = 0.0;
    let mut responded_count: u64 = 0;

    for request in requests {
        if let Some(submitted) = request.date_submitted {
            let day = submitted.date_naive();
            let key = day.format(DAY_KEY).to_string();

            // Submissions before the window start only miss the chart;
            // they still count everywhere else.
            if let Some(slot) = daily_volume.get_mut(&key) {
                *slot += 1;
            }
            // Legacy trailing-30-day accumulation, retained for dashboard
            // output parity. Days covered by both paths count twice.
            if day >= thirty_days_ago {
                if let Some(slot) = daily_volume.get_mut(&key) {
                    *slot += 1;
                }
            }
        }

        *status_counts
            .entry(request.status.as_str().to_string())
            .or_insert(0) += 1;

        if let (Some(submitted), Some(responded)) = (request.date_submitted, request.date_responded)
        {
            response_days_sum += (responded - submitted).num_milliseconds() as f64 / MS_PER_DAY;
            responded_count += 1;
        }

        *source_distribution
            .entry(request.proxy_tenant_id.clone())
            .or_insert(0) += 1;

        // The save-offer funnel scans the full status history, so one
        // request can contribute to several buckets over its lifetime.
        if let Some(log) = logs_by_request.get(request.id.as_str()) {
            for change in &log.changes {
                if change.field != "status" {
                    continue;
                }
                match change.new_value.as_str() {
                    Some("Save Offered") => save_offer_counts.offered += 1,
                    Some("Save Accepted") => save_offer_counts.accepted += 1,
                    Some("Save Declined") => save_offer_counts.declined += 1,
                    _ => {}
                }
            }
        }
    }

    let average_response_time = if responded_count == 0 {
        0.0
    } else {
        (response_days_sum / responded_count as f64 * 10.0).round() / 10.0
    };

    let sources: HashSet<&str> = requests
        .iter()
        .map(|request| request.proxy_tenant_id.as_str())
        .collect();
    let tenants = tenants
        .iter()
        .filter(|tenant| sources.contains(tenant.id.as_str()))
        .map(|tenant| TenantRef {
            id: tenant.id.clone(),
            name: tenant.name.clone(),
        })
        .collect();

    StatsResponse {
        requests: RequestStats {
            total_count: requests.len() as u64,
            status_counts,
            average_response_time,
            daily_volume,
            source_distribution,
            save_offer_counts,
        },
        tenants,
    }
}
