pub mod filters;
pub mod report;

pub use filters::{DateRange, GroupBy, MetricsFilter, ReportFilter};
pub use report::{
    ClientReport, ClientSummary, GeneralMetrics, ProviderReport, ProviderSummary, SalesReport,
    SatisfactionReport, ScoreShare, ServiceSold, ServiceSummary, TrendPoint,
};
