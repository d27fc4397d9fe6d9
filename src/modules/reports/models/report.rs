use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::modules::marketplace::{Client, EntityId, Provider, Service};

/// Display fields of a service as they appear inside a report
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSummary {
    pub id: EntityId,
    pub name: String,
    pub price: Decimal,
}

impl From<&Service> for ServiceSummary {
    fn from(service: &Service) -> Self {
        Self {
            id: service.id.clone(),
            name: service.display_name(),
            price: service.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSummary {
    pub id: EntityId,
    pub name: String,
}

impl From<&Provider> for ProviderSummary {
    fn from(provider: &Provider) -> Self {
        Self {
            id: provider.id.clone(),
            name: provider.display_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSummary {
    pub id: EntityId,
    pub name: String,
    pub email: Option<String>,
}

impl From<&Client> for ClientSummary {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id.clone(),
            name: client.display_name(),
            email: client.email.clone(),
        }
    }
}

/// Units and revenue of one service within a sales aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSold {
    pub service: ServiceSummary,
    pub quantity_sold: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesReport {
    pub period: String,
    pub total_sales: Decimal,
    pub booking_count: i64,
    pub average_per_booking: Decimal,
    pub top_services: Vec<ServiceSold>,
}

impl SalesReport {
    /// Zero-valued shape for a period with nothing to report
    pub fn empty(period: String) -> Self {
        Self {
            period,
            total_sales: Decimal::ZERO,
            booking_count: 0,
            average_per_booking: Decimal::ZERO,
            top_services: Vec::new(),
        }
    }
}

/// How many ratings gave one particular score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreShare {
    pub score: i64,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SatisfactionReport {
    pub service: ServiceSummary,
    pub total_ratings: i64,
    pub average_rating: f64,
    /// Ascending by score
    pub distribution: Vec<ScoreShare>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReport {
    pub provider: ProviderSummary,
    pub total_services: i64,
    pub active_services: i64,
    pub total_revenue: Decimal,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientReport {
    pub client: ClientSummary,
    pub total_bookings: i64,
    pub total_spend: Decimal,
    pub average_spend: Decimal,
    pub last_booking: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneralMetrics {
    pub total_users: i64,
    pub total_clients: i64,
    pub total_providers: i64,
    pub total_services: i64,
    pub total_bookings: i64,
    pub total_revenue: Decimal,
    pub average_satisfaction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    /// First day of the bucket
    pub date: NaiveDate,
    pub value: Decimal,
    pub label: String,
}
