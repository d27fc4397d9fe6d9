pub mod aggregation;
pub mod ranking;
pub mod reconciler;
mod report_service;
pub mod trends;

pub use reconciler::EntityReconciler;
pub use report_service::ReportService;
