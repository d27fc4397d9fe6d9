//! Pure folds from fetched collections into report aggregates.
//!
//! Nothing in here talks to the upstream: every function works on an
//! already-fetched snapshot plus the services the reconciler resolved.
//! Money stays exact `Decimal` throughout; rounding happens on output.
//! A sum or product that leaves the `Decimal` (or `i64`) range fails the
//! fold with `DecodeMismatch` naming the collection it came from.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use super::ranking;
use crate::core::{AppError, Result};
use crate::modules::marketplace::{
    Booking, BookingLineItem, Client, EntityId, EntityKind, Provider, Rating, Reference, Service,
};
use crate::modules::reports::models::{
    ClientReport, ClientSummary, GeneralMetrics, ProviderReport, ProviderSummary, SalesReport,
    SatisfactionReport, ScoreShare, ServiceSold, ServiceSummary,
};

pub(crate) fn overflow(kind: EntityKind, what: impl std::fmt::Display) -> AppError {
    AppError::decode(kind.name(), format!("{} is out of range", what))
}

/// How a line item's quantity is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityRule {
    /// Items embedded in bookings: absent counts as zero
    AsGiven,
    /// Items fetched on their own: absent or non-positive counts as one unit
    DefaultToOne,
}

impl QuantityRule {
    pub fn quantity(&self, item: &BookingLineItem) -> i64 {
        match self {
            QuantityRule::AsGiven => item.quantity.unwrap_or(0).max(0),
            QuantityRule::DefaultToOne => match item.quantity {
                Some(q) if q > 0 => q,
                _ => 1,
            },
        }
    }
}

fn item_label(item: &BookingLineItem) -> String {
    match &item.id {
        Some(id) => format!("revenue of line item {}", id),
        None => "revenue of a line item".to_string(),
    }
}

/// Subtotal, else unit price × quantity, else service price × quantity.
pub fn line_item_revenue(item: &BookingLineItem, quantity: i64, service: Option<&Service>) -> Result<Decimal> {
    if !item.subtotal.is_zero() {
        return Ok(item.subtotal);
    }

    let quantity = Decimal::from(quantity);
    let revenue = if !item.unit_price.is_zero() {
        item.unit_price.checked_mul(quantity)
    } else {
        service.map_or(Some(Decimal::ZERO), |s| s.price.checked_mul(quantity))
    };
    revenue.ok_or_else(|| overflow(EntityKind::LineItem, item_label(item)))
}

/// `total / count`, zero when nothing was counted
pub fn average(total: Decimal, count: i64) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        total / Decimal::from(count)
    }
}

pub fn mean_score(sum: i64, count: i64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Sum of booking totals and number of bookings
pub fn booking_totals<'a>(bookings: impl IntoIterator<Item = &'a Booking>) -> Result<(Decimal, i64)> {
    bookings
        .into_iter()
        .try_fold((Decimal::ZERO, 0i64), |(total, count), booking| {
            total
                .checked_add(booking.total_estimated)
                .map(|total| (total, count + 1))
                .ok_or_else(|| overflow(EntityKind::Booking, format!("running total at booking {}", booking.id)))
        })
}

/// Sum of rating scores
fn score_sum<'a>(ratings: impl IntoIterator<Item = &'a Rating>) -> Result<i64> {
    ratings.into_iter().try_fold(0i64, |sum, rating| {
        sum.checked_add(rating.score)
            .ok_or_else(|| overflow(EntityKind::Rating, format!("score sum at rating {}", rating.id)))
    })
}

/// Best known copy of the service an item points at
pub fn service_for<'a>(
    item: &'a BookingLineItem,
    services: &'a HashMap<EntityId, Service>,
) -> Option<&'a Service> {
    let reference = item.service.as_ref()?;
    services
        .get(reference.id())
        .or_else(|| reference.entity())
}

fn summary_for(id: &EntityId, service: Option<&Service>) -> ServiceSummary {
    match service {
        Some(service) => ServiceSummary::from(service),
        None => ServiceSummary {
            id: id.clone(),
            name: id.to_string(),
            price: Decimal::ZERO,
        },
    }
}

/// Per-service quantity and revenue, kept in first-seen order
#[derive(Debug, Default)]
pub struct SalesAccumulator {
    buckets: Vec<ServiceSold>,
    index: HashMap<EntityId, usize>,
}

impl SalesAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, service: ServiceSummary, quantity: i64, revenue: Decimal) -> Result<()> {
        match self.index.get(&service.id) {
            Some(&slot) => {
                let bucket = &mut self.buckets[slot];
                let (Some(quantity_sold), Some(total)) = (
                    bucket.quantity_sold.checked_add(quantity),
                    bucket.revenue.checked_add(revenue),
                ) else {
                    return Err(overflow(EntityKind::LineItem, format!("sales of service {}", service.id)));
                };
                bucket.quantity_sold = quantity_sold;
                bucket.revenue = total;
            }
            None => {
                self.index.insert(service.id.clone(), self.buckets.len());
                self.buckets.push(ServiceSold {
                    service,
                    quantity_sold: quantity,
                    revenue,
                });
            }
        }
        Ok(())
    }

    /// Fold line items into the buckets. `admit` sees the resolved service
    /// (if any) and decides whether the item counts.
    pub fn add_items<'a, F>(
        &mut self,
        items: impl IntoIterator<Item = &'a BookingLineItem>,
        services: &HashMap<EntityId, Service>,
        rule: QuantityRule,
        admit: F,
    ) -> Result<()>
    where
        F: Fn(Option<&Service>) -> bool,
    {
        for item in items {
            let Some(id) = item.service_id() else {
                debug!(item = ?item.id, "Line item without a service, skipped");
                continue;
            };

            let service = service_for(item, services);
            if !admit(service) {
                continue;
            }

            let quantity = rule.quantity(item);
            let revenue = line_item_revenue(item, quantity, service)?;
            self.add(summary_for(id, service), quantity, revenue)?;
        }
        Ok(())
    }

    /// Units across all buckets, `None` past `i64::MAX`
    pub fn total_quantity(&self) -> Option<i64> {
        self.buckets
            .iter()
            .try_fold(0i64, |sum, b| sum.checked_add(b.quantity_sold))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn into_buckets(self) -> Vec<ServiceSold> {
        self.buckets
    }
}

pub fn sales_report(
    period: String,
    bookings: &[Booking],
    accumulator: SalesAccumulator,
    limit: usize,
) -> Result<SalesReport> {
    let (total_sales, booking_count) = booking_totals(bookings)?;

    Ok(SalesReport {
        period,
        total_sales,
        booking_count,
        average_per_booking: average(total_sales, booking_count),
        top_services: ranking::most_popular(accumulator.into_buckets(), limit),
    })
}

#[derive(Default)]
struct RatingBucket {
    sum: i64,
    count: i64,
    distribution: BTreeMap<i64, i64>,
}

impl RatingBucket {
    fn add(&mut self, score: i64) -> Option<()> {
        self.sum = self.sum.checked_add(score)?;
        self.count += 1;
        *self.distribution.entry(score).or_insert(0) += 1;
        Some(())
    }
}

/// One entry per rated service, in first-seen order
pub fn satisfaction_reports<'a>(
    ratings: impl IntoIterator<Item = &'a Rating>,
    services: &HashMap<EntityId, Service>,
) -> Result<Vec<SatisfactionReport>> {
    let mut order: Vec<(ServiceSummary, RatingBucket)> = Vec::new();
    let mut index: HashMap<EntityId, usize> = HashMap::new();

    for rating in ratings {
        let Some(reference) = rating.service.as_ref() else {
            debug!(rating = %rating.id, "Rating without a service, skipped");
            continue;
        };
        let id = reference.id();

        let slot = match index.get(id) {
            Some(&slot) => slot,
            None => {
                let service = services.get(id).or_else(|| reference.entity());
                index.insert(id.clone(), order.len());
                order.push((summary_for(id, service), RatingBucket::default()));
                order.len() - 1
            }
        };
        order[slot]
            .1
            .add(rating.score)
            .ok_or_else(|| overflow(EntityKind::Rating, format!("score sum of service {}", id)))?;
    }

    Ok(order
        .into_iter()
        .map(|(service, bucket)| {
            let distribution = bucket
                .distribution
                .iter()
                .map(|(&score, &count)| ScoreShare {
                    score,
                    count,
                    percentage: count as f64 / bucket.count as f64 * 100.0,
                })
                .collect();

            SatisfactionReport {
                service,
                total_ratings: bucket.count,
                average_rating: mean_score(bucket.sum, bucket.count),
                distribution,
            }
        })
        .collect())
}

/// Revenue and number of sold items per service id
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ServiceSales {
    pub revenue: Decimal,
    pub items: i64,
}

pub fn sales_by_service<'a>(
    items: impl IntoIterator<Item = &'a BookingLineItem>,
    services: &HashMap<EntityId, Service>,
    rule: QuantityRule,
) -> Result<HashMap<EntityId, ServiceSales>> {
    let mut sales: HashMap<EntityId, ServiceSales> = HashMap::new();

    for item in items {
        let Some(id) = item.service_id() else {
            continue;
        };
        let quantity = rule.quantity(item);
        let revenue = line_item_revenue(item, quantity, service_for(item, services))?;

        let entry = sales.entry(id.clone()).or_default();
        entry.revenue = entry
            .revenue
            .checked_add(revenue)
            .ok_or_else(|| overflow(EntityKind::LineItem, format!("revenue of service {}", id)))?;
        entry.items += 1;
    }

    Ok(sales)
}

/// One report per provider, in the order given.
///
/// A provider's services are those in `services` pointing at it, plus the
/// ids it lists itself when they are present in `services`.
pub fn provider_reports(
    providers: &[Provider],
    services: &HashMap<EntityId, Service>,
    ratings: &[Rating],
    items: &[BookingLineItem],
    rule: QuantityRule,
) -> Result<Vec<ProviderReport>> {
    let sold = sales_by_service(items, services, rule)?;

    let mut scores: HashMap<&EntityId, (i64, i64)> = HashMap::new();
    for rating in ratings {
        if let Some(id) = rating.service_id() {
            let entry = scores.entry(id).or_insert((0, 0));
            entry.0 = entry
                .0
                .checked_add(rating.score)
                .ok_or_else(|| overflow(EntityKind::Rating, format!("score sum of service {}", id)))?;
            entry.1 += 1;
        }
    }

    let mut owned: HashMap<&EntityId, HashSet<&EntityId>> = HashMap::new();
    for service in services.values() {
        if let Some(provider_id) = service.provider_id() {
            owned.entry(provider_id).or_default().insert(&service.id);
        }
    }

    providers
        .iter()
        .map(|provider| -> Result<ProviderReport> {
            let mut ids: HashSet<&EntityId> = owned.get(&provider.id).cloned().unwrap_or_default();
            ids.extend(
                provider
                    .services
                    .iter()
                    .map(Reference::id)
                    .filter(|id| services.contains_key(*id)),
            );

            let mut total_revenue = Decimal::ZERO;
            let mut active_services = 0;
            let (mut score_sum, mut score_count) = (0i64, 0i64);
            let out_of_range = || overflow(EntityKind::Provider, format!("totals of provider {}", provider.id));

            for id in &ids {
                if let Some(sales) = sold.get(*id) {
                    total_revenue = total_revenue.checked_add(sales.revenue).ok_or_else(out_of_range)?;
                    if sales.items > 0 {
                        active_services += 1;
                    }
                }
                if let Some((sum, count)) = scores.get(*id) {
                    score_sum = score_sum.checked_add(*sum).ok_or_else(out_of_range)?;
                    score_count += count;
                }
            }

            Ok(ProviderReport {
                provider: ProviderSummary::from(provider),
                total_services: ids.len() as i64,
                active_services,
                total_revenue,
                average_rating: mean_score(score_sum, score_count),
            })
        })
        .collect()
}

/// One report per client, in the order given; clients without bookings get zeros.
pub fn client_reports(clients: &[Client], bookings: &[Booking]) -> Result<Vec<ClientReport>> {
    let mut stats: HashMap<&EntityId, (Decimal, i64, Option<chrono::NaiveDate>)> = HashMap::new();

    for booking in bookings {
        let Some(client_id) = booking.client_id() else {
            continue;
        };
        let entry = stats
            .entry(client_id)
            .or_insert((Decimal::ZERO, 0, None));
        entry.0 = entry
            .0
            .checked_add(booking.total_estimated)
            .ok_or_else(|| overflow(EntityKind::Booking, format!("spend of client {}", client_id)))?;
        entry.1 += 1;
        entry.2 = entry.2.max(booking.date);
    }

    Ok(clients
        .iter()
        .map(|client| {
            let (total_spend, total_bookings, last_booking) = stats
                .get(&client.id)
                .copied()
                .unwrap_or((Decimal::ZERO, 0, None));

            ClientReport {
                client: ClientSummary::from(client),
                total_bookings,
                total_spend,
                average_spend: average(total_spend, total_bookings),
                last_booking,
            }
        })
        .collect())
}

pub fn general_metrics(
    total_clients: usize,
    total_providers: usize,
    total_services: usize,
    bookings: &[Booking],
    ratings: &[Rating],
) -> Result<GeneralMetrics> {
    let (total_revenue, total_bookings) = booking_totals(bookings)?;
    let scores = score_sum(ratings)?;

    Ok(GeneralMetrics {
        total_users: (total_clients + total_providers) as i64,
        total_clients: total_clients as i64,
        total_providers: total_providers as i64,
        total_services: total_services as i64,
        total_bookings,
        total_revenue,
        average_satisfaction: mean_score(scores, ratings.len() as i64),
    })
}
