use crate::models::{AvgResponseTime, PartyAverage, RequestChange, TenantType};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Average elapsed time between consecutive status transitions, split by
/// the party that made the later transition of each pair.
///
/// This measures "once it became their turn, how long until they acted":
/// each gap is attributed to whoever closed it, and transitions made by
/// management actors leave their gap unattributed. Zero or one status
/// change yields zeroes. Pure and total.
pub fn average_response_time(changes: &[RequestChange]) -> AvgResponseTime {
    let status_changes: Vec<&RequestChange> =
        changes.iter().filter(|c| c.field == "status").collect();

    let mut provider_sum: i64 = 0;
    let mut provider_count: u32 = 0;
    let mut proxy_sum: i64 = 0;
    let mut proxy_count: u32 = 0;

    for pair in status_changes.windows(2) {
        let delta = pair[1].updated_at - pair[0].updated_at;
        match pair[1].changed_by.tenant_type {
            TenantType::Provider => {
                provider_sum += delta;
                provider_count += 1;
            }
            TenantType::Proxy => {
                proxy_sum += delta;
                proxy_count += 1;
            }
            TenantType::Management => {}
        }
    }

    AvgResponseTime {
        provider: party_average(provider_sum, provider_count),
        proxy: party_average(proxy_sum, proxy_count),
    }
}

fn party_average(sum: i64, count: u32) -> PartyAverage {
    if count == 0 {
        return PartyAverage::default();
    }
    let ms = sum as f64 / count as f64;
    PartyAverage {
        ms,
        hours: (ms / MS_PER_HOUR * 100.0).round() / 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::status_change;

    #[test]
    fn empty_changes_yield_zeroes() {
        let result = average_response_time(&[]);
        assert_eq!(result, AvgResponseTime::default());
    }

    #[test]
    fn single_status_change_yields_zeroes() {
        let changes = vec![status_change("Pending", TenantType::Proxy, 1_000)];
        assert_eq!(average_response_time(&changes), AvgResponseTime::default());
    }

    #[test]
    fn deltas_attribute_to_the_actor_of_the_later_change() {
        let base = 1_700_000_000_000;
        let changes = vec![
            status_change("Pending", TenantType::Proxy, base),
            // Provider answers 30862ms after submission
            status_change("Save Offered", TenantType::Provider, base + 30_862),
            // Proxy answers 70724ms after the offer
            status_change("Save Accepted", TenantType::Proxy, base + 30_862 + 70_724),
        ];

        let result = average_response_time(&changes);
        assert_eq!(result.provider.ms, 30_862.0);
        assert_eq!(result.provider.hours, 0.01);
        assert_eq!(result.proxy.ms, 70_724.0);
        assert_eq!(result.proxy.hours, 0.02);
    }

    #[test]
    fn multiple_deltas_per_party_average_arithmetically() {
        let base = 0;
        let changes = vec![
            status_change("Pending", TenantType::Proxy, base),
            status_change("Save Offered", TenantType::Provider, base + 2_000),
            status_change("Save Declined", TenantType::Proxy, base + 3_000),
            status_change("Canceled", TenantType::Provider, base + 7_000),
        ];

        let result = average_response_time(&changes);
        // Provider gaps: 2000 and 4000
        assert_eq!(result.provider.ms, 3_000.0);
        // Proxy gap: 1000
        assert_eq!(result.proxy.ms, 1_000.0);
    }

    #[test]
    fn management_transitions_leave_gaps_unattributed() {
        let changes = vec![
            status_change("Pending", TenantType::Proxy, 0),
            status_change("Canceled", TenantType::Management, 5_000),
        ];
        assert_eq!(average_response_time(&changes), AvgResponseTime::default());
    }

    #[test]
    fn non_status_changes_are_ignored() {
        let mut changes = vec![
            status_change("Pending", TenantType::Proxy, 0),
            status_change("Canceled", TenantType::Provider, 10_000),
        ];
        // A notes edit between the two status changes must not split the gap
        let mut notes = status_change("ignored", TenantType::Provider, 4_000);
        notes.field = "notes".to_string();
        changes.insert(1, notes);

        let result = average_response_time(&changes);
        assert_eq!(result.provider.ms, 10_000.0);
        assert_eq!(result.proxy.ms, 0.0);
    }

    #[test]
    fn hours_round_to_two_decimals() {
        let changes = vec![
            status_change("Pending", TenantType::Proxy, 0),
            // 5.4321 hours
            status_change("Canceled", TenantType::Provider, 19_555_560),
        ];
        let result = average_response_time(&changes);
        assert_eq!(result.provider.hours, 5.43);
    }
}
