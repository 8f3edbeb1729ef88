use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantType {
    Proxy,
    Provider,
    Management,
}

/// A named retention offer a provider can extend in response to a
/// cancellation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveOfferTemplate {
    pub id: String,
    pub title: String,
}

/// An organization. Providers own subscriptions; proxies submit requests on
/// behalf of end customers; management tenants operate the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub tenant_type: TenantType,
    pub active: bool,
    /// Customer-info fields this provider demands on every request, in the
    /// order its intake form presents them. Empty for non-providers.
    #[serde(default)]
    pub required_customer_info: Vec<String>,
    #[serde(default)]
    pub save_offers: Vec<SaveOfferTemplate>,
    #[serde(default)]
    pub admins: Vec<String>,
}
