pub mod change_detector;
pub mod log_service;
pub mod request_service;
pub mod response_time;
pub mod stats_service;

use crate::store::StoreError;

pub use change_detector::{detect_changes, ChangeDraft};
pub use log_service::RequestLogService;
pub use request_service::RequestService;
pub use response_time::average_response_time;
pub use stats_service::StatsService;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
