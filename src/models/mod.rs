pub mod request;
pub mod request_log;
pub mod stats;
pub mod tenant;

pub use request::{DeclineReason, NewRequest, Request, RequestStatus, RequestType, SaveOffer};
pub use request_log::{AvgResponseTime, ChangedBy, PartyAverage, RequestChange, RequestLog};
pub use stats::{RequestStats, SaveOfferCounts, StatsQuery, StatsResponse, TenantRef};
pub use tenant::{SaveOfferTemplate, Tenant, TenantType};
