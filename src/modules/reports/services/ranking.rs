//! Deterministic orderings over report aggregates.
//!
//! All sorts are stable: entries that compare equal keep their input order.

use crate::modules::reports::models::{ClientReport, ProviderReport, SatisfactionReport, ServiceSold};

fn truncate<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    items.truncate(limit);
    items
}

/// Quantity sold, descending
pub fn most_popular(mut services: Vec<ServiceSold>, limit: usize) -> Vec<ServiceSold> {
    services.sort_by(|a, b| b.quantity_sold.cmp(&a.quantity_sold));
    truncate(services, limit)
}

/// Average rating, descending
pub fn top_rated(mut providers: Vec<ProviderReport>, limit: usize) -> Vec<ProviderReport> {
    providers.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
    truncate(providers, limit)
}

/// Booking count descending, then total spend descending
pub fn most_active(mut clients: Vec<ClientReport>, limit: usize) -> Vec<ClientReport> {
    clients.sort_by(|a, b| {
        b.total_bookings
            .cmp(&a.total_bookings)
            .then_with(|| b.total_spend.cmp(&a.total_spend))
    });
    truncate(clients, limit)
}

pub fn by_revenue(mut providers: Vec<ProviderReport>) -> Vec<ProviderReport> {
    providers.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue));
    providers
}

pub fn by_spend(mut clients: Vec<ClientReport>) -> Vec<ClientReport> {
    clients.sort_by(|a, b| b.total_spend.cmp(&a.total_spend));
    clients
}

pub fn by_average_rating(mut reports: Vec<SatisfactionReport>) -> Vec<SatisfactionReport> {
    reports.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
    reports
}
