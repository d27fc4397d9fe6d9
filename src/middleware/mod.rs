pub mod auth;
pub mod error_handler;
pub mod metrics;
pub mod request_id;

pub use error_handler::{query_error_handler, ErrorHandler};
pub use metrics::{MetricsCollector, MetricsMiddleware};
pub use request_id::RequestId;
