mod health_controller;
mod metrics;

pub use health_controller::{configure, HealthResponse, ReadinessResponse};
pub use metrics::get_metrics;
