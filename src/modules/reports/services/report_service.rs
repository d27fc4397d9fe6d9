use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

use super::aggregation::{self, QuantityRule, SalesAccumulator};
use super::ranking;
use super::reconciler::EntityReconciler;
use super::trends;
use crate::config::{DegradePolicy, ReportConfig};
use crate::core::{Credentials, Result};
use crate::modules::marketplace::models::LineItemFilter;
use crate::modules::marketplace::{
    Booking, BookingLineItem, Client, EntityId, EntityKind, MarketplaceRepository, Provider,
    Reference, Service,
};
use crate::modules::reports::models::{
    ClientReport, GeneralMetrics, MetricsFilter, ProviderReport, ReportFilter, SalesReport,
    SatisfactionReport, ServiceSold, TrendPoint,
};

/// Bookings and per-service buckets behind the sales views
struct SalesSnapshot {
    bookings: Vec<Booking>,
    accumulator: SalesAccumulator,
}

/// Builds every report from upstream collections.
///
/// One call is one computation: collections are fetched (independent ones
/// concurrently), references reconciled with a fresh memo, and the result
/// folded in memory. Nothing is kept between calls.
pub struct ReportService {
    repository: Arc<dyn MarketplaceRepository>,
    config: ReportConfig,
}

impl ReportService {
    pub fn new(repository: Arc<dyn MarketplaceRepository>, config: ReportConfig) -> Self {
        Self { repository, config }
    }

    pub fn default_limit(&self) -> usize {
        self.config.default_limit
    }

    /// Primary collection: `None` means "answer with the zero-valued shape".
    fn primary<T>(&self, kind: EntityKind, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if self.config.degrade_policy == DegradePolicy::ZeroValue && e.is_upstream() => {
                warn!(resource = %kind, error = %e, "Primary collection failed, answering with zero values");
                Ok(None)
            }
            Err(e) => {
                warn!(resource = %kind, error = %e, "Primary collection failed");
                Err(e)
            }
        }
    }

    /// Secondary collection: a failure contributes nothing.
    fn secondary<T>(kind: EntityKind, result: Result<Vec<T>>) -> Vec<T> {
        result.unwrap_or_else(|e| {
            warn!(resource = %kind, error = %e, "Secondary collection failed, treating as empty");
            Vec::new()
        })
    }

    async fn collect_sales(
        &self,
        credentials: &Credentials,
        filter: &ReportFilter,
    ) -> Result<Option<SalesSnapshot>> {
        filter.validate()?;

        let fetched = self
            .repository
            .list_bookings(credentials, Some(&filter.booking_filter()), None)
            .await;
        let Some(bookings) = self.primary(EntityKind::Booking, fetched)? else {
            return Ok(None);
        };

        let bookings: Vec<Booking> = bookings
            .into_iter()
            .filter(|b| filter.admits_booking(b))
            .collect();

        let embedded = bookings.iter().any(|b| !b.line_items.is_empty());
        let (items, rule): (Vec<BookingLineItem>, QuantityRule) = if embedded {
            let items = bookings
                .iter()
                .flat_map(|b| b.line_items.iter().cloned())
                .collect();
            (items, QuantityRule::AsGiven)
        } else if bookings.is_empty() {
            (Vec::new(), QuantityRule::AsGiven)
        } else {
            let included: HashSet<&EntityId> = bookings.iter().map(|b| &b.id).collect();
            let line_filter = LineItemFilter {
                booking_id: None,
                provider_id: filter.provider_id.clone(),
            };
            let fetched = self
                .repository
                .list_line_items(credentials, Some(&line_filter), None)
                .await;
            let items = Self::secondary(EntityKind::LineItem, fetched)
                .into_iter()
                .filter(|item| item.booking_id().is_some_and(|id| included.contains(id)))
                .collect();
            (items, QuantityRule::DefaultToOne)
        };

        let mut reconciler = EntityReconciler::new(self.repository.as_ref(), credentials);
        reconciler
            .resolve_services(items.iter().filter_map(|i| i.service.as_ref()))
            .await;
        let services = reconciler.into_services();

        let mut accumulator = SalesAccumulator::new();
        accumulator.add_items(&items, &services, rule, |service| {
            admits_service(filter, service)
        })?;

        Ok(Some(SalesSnapshot {
            bookings,
            accumulator,
        }))
    }

    pub async fn sales_report(
        &self,
        credentials: &Credentials,
        filter: &ReportFilter,
    ) -> Result<SalesReport> {
        let period = filter.period_label();
        let Some(snapshot) = self.collect_sales(credentials, filter).await? else {
            return Ok(SalesReport::empty(period));
        };

        let report = aggregation::sales_report(
            period,
            &snapshot.bookings,
            snapshot.accumulator,
            self.config.default_limit,
        )?;

        info!(
            period = %report.period,
            bookings = report.booking_count,
            total = %report.total_sales,
            "Sales report generated"
        );
        Ok(report)
    }

    pub async fn most_popular_services(
        &self,
        credentials: &Credentials,
        limit: Option<usize>,
    ) -> Result<Vec<ServiceSold>> {
        let limit = limit.unwrap_or(self.config.default_limit);
        let Some(snapshot) = self
            .collect_sales(credentials, &ReportFilter::default())
            .await?
        else {
            return Ok(Vec::new());
        };

        Ok(ranking::most_popular(snapshot.accumulator.into_buckets(), limit))
    }

    pub async fn satisfaction_report(
        &self,
        credentials: &Credentials,
        filter: &ReportFilter,
    ) -> Result<Vec<SatisfactionReport>> {
        filter.validate()?;

        let fetched = self.repository.list_ratings(credentials, None, None).await;
        let Some(ratings) = self.primary(EntityKind::Rating, fetched)? else {
            return Ok(Vec::new());
        };

        let mut reconciler = EntityReconciler::new(self.repository.as_ref(), credentials);
        reconciler
            .resolve_services(ratings.iter().filter_map(|r| r.service.as_ref()))
            .await;
        let services = reconciler.into_services();

        let ratings: Vec<_> = ratings
            .into_iter()
            .filter(|r| filter.range.admits(r.date))
            .filter(|r| {
                let service = r.service_id().and_then(|id| services.get(id));
                admits_service(filter, service)
            })
            .collect();

        let reports = ranking::by_average_rating(aggregation::satisfaction_reports(&ratings, &services)?);
        info!(services = reports.len(), ratings = ratings.len(), "Satisfaction report generated");
        Ok(reports)
    }

    pub async fn provider_report(
        &self,
        credentials: &Credentials,
        filter: &ReportFilter,
    ) -> Result<Vec<ProviderReport>> {
        filter.validate()?;

        let service_filter = filter.service_filter();
        let line_filter = LineItemFilter {
            booking_id: None,
            provider_id: filter.provider_id.clone(),
        };
        let booking_filter = filter.booking_filter();
        let repo = self.repository.as_ref();

        let (providers, services, ratings, items, bookings) = tokio::join!(
            repo.list_providers(credentials, None),
            repo.list_services(credentials, Some(&service_filter), None),
            repo.list_ratings(credentials, None, None),
            repo.list_line_items(credentials, Some(&line_filter), None),
            async {
                if filter.restricts_bookings() {
                    Some(repo.list_bookings(credentials, Some(&booking_filter), None).await)
                } else {
                    None
                }
            },
        );

        let Some(mut providers) = self.primary(EntityKind::Provider, providers)? else {
            return Ok(Vec::new());
        };
        let services = Self::secondary(EntityKind::Service, services);
        let ratings: Vec<_> = Self::secondary(EntityKind::Rating, ratings)
            .into_iter()
            .filter(|r| filter.range.admits(r.date))
            .collect();
        let mut items = Self::secondary(EntityKind::LineItem, items);

        if let Some(bookings) = bookings {
            let admitted: HashSet<EntityId> = Self::secondary(EntityKind::Booking, bookings)
                .into_iter()
                .filter(|b| filter.admits_booking(b))
                .map(|b| b.id)
                .collect();
            items.retain(|item| item.booking_id().is_some_and(|id| admitted.contains(id)));
        }

        let mut reconciler = EntityReconciler::new(repo, credentials);
        reconciler.seed_services(services);
        let listed: Vec<Reference<Service>> = providers
            .iter()
            .flat_map(|p| p.services.iter().cloned())
            .collect();
        reconciler
            .resolve_services(
                items
                    .iter()
                    .filter_map(|i| i.service.as_ref())
                    .chain(listed.iter()),
            )
            .await;

        // Providers owning services but missing from the listing
        let known: HashSet<EntityId> = providers.iter().map(|p| p.id.clone()).collect();
        let missing: Vec<Reference<Provider>> = reconciler
            .services()
            .values()
            .filter_map(|s| s.provider.clone())
            .filter(|p| !known.contains(p.id()))
            .fold(HashMap::new(), |mut acc: HashMap<EntityId, Reference<Provider>>, p| {
                acc.entry(p.id().clone()).or_insert(p);
                acc
            })
            .into_values()
            .collect();
        for reference in &missing {
            providers.push(reconciler.resolve_provider(reference).await);
        }

        let services: HashMap<EntityId, Service> = reconciler
            .into_services()
            .into_iter()
            .filter(|(_, s)| admits_category(filter, s))
            .collect();

        providers.retain(|p| {
            filter.provider_id.as_ref().map_or(true, |id| &p.id == id)
                && filter.city.as_deref().map_or(true, |city| {
                    p.city().is_some_and(|c| c.eq_ignore_ascii_case(city.trim()))
                })
        });

        let reports = ranking::by_revenue(aggregation::provider_reports(
            &providers,
            &services,
            &ratings,
            &items,
            QuantityRule::DefaultToOne,
        )?);
        info!(providers = reports.len(), "Provider report generated");
        Ok(reports)
    }

    pub async fn top_rated_providers(
        &self,
        credentials: &Credentials,
        limit: Option<usize>,
    ) -> Result<Vec<ProviderReport>> {
        let limit = limit.unwrap_or(self.config.default_limit);
        let reports = self
            .provider_report(credentials, &ReportFilter::default())
            .await?;
        Ok(ranking::top_rated(reports, limit))
    }

    async fn collect_client_reports(
        &self,
        credentials: &Credentials,
        filter: &ReportFilter,
    ) -> Result<Vec<ClientReport>> {
        filter.validate()?;

        let booking_filter = filter.booking_filter();
        let repo = self.repository.as_ref();
        let (clients, bookings) = tokio::join!(
            repo.list_clients(credentials, None),
            repo.list_bookings(credentials, Some(&booking_filter), None),
        );

        let Some(mut clients) = self.primary(EntityKind::Client, clients)? else {
            return Ok(Vec::new());
        };
        let bookings: Vec<Booking> = Self::secondary(EntityKind::Booking, bookings)
            .into_iter()
            .filter(|b| filter.admits_booking(b))
            .collect();

        // Clients with bookings but missing from the listing
        let known: HashSet<EntityId> = clients.iter().map(|c| c.id.clone()).collect();
        let mut seen: HashSet<EntityId> = HashSet::new();
        let missing: Vec<&Reference<Client>> = bookings
            .iter()
            .filter_map(|b| b.client.as_ref())
            .filter(|c| !known.contains(c.id()) && seen.insert(c.id().clone()))
            .collect();

        let mut reconciler = EntityReconciler::new(repo, credentials);
        for reference in missing {
            clients.push(reconciler.resolve_client(reference).await);
        }

        aggregation::client_reports(&clients, &bookings)
    }

    pub async fn client_report(
        &self,
        credentials: &Credentials,
        filter: &ReportFilter,
    ) -> Result<Vec<ClientReport>> {
        let reports = ranking::by_spend(self.collect_client_reports(credentials, filter).await?);
        info!(clients = reports.len(), "Client report generated");
        Ok(reports)
    }

    pub async fn most_active_clients(
        &self,
        credentials: &Credentials,
        limit: Option<usize>,
    ) -> Result<Vec<ClientReport>> {
        let limit = limit.unwrap_or(self.config.default_limit);
        let reports = self
            .collect_client_reports(credentials, &ReportFilter::default())
            .await?;
        Ok(ranking::most_active(reports, limit))
    }

    pub async fn general_metrics(
        &self,
        credentials: &Credentials,
        filter: &MetricsFilter,
    ) -> Result<GeneralMetrics> {
        filter.validate()?;

        let booking_filter = filter.booking_filter();
        let repo = self.repository.as_ref();
        let (clients, providers, services, bookings, ratings) = tokio::join!(
            repo.list_clients(credentials, None),
            repo.list_providers(credentials, None),
            repo.list_services(credentials, None, None),
            repo.list_bookings(credentials, Some(&booking_filter), None),
            repo.list_ratings(credentials, None, None),
        );

        let Some(bookings) = self.primary(EntityKind::Booking, bookings)? else {
            return Ok(GeneralMetrics::default());
        };
        let bookings: Vec<Booking> = bookings
            .into_iter()
            .filter(|b| filter.range.admits(b.date))
            .collect();
        let ratings: Vec<_> = Self::secondary(EntityKind::Rating, ratings)
            .into_iter()
            .filter(|r| filter.range.admits(r.date))
            .collect();

        let metrics = aggregation::general_metrics(
            Self::secondary::<Client>(EntityKind::Client, clients).len(),
            Self::secondary::<Provider>(EntityKind::Provider, providers).len(),
            Self::secondary::<Service>(EntityKind::Service, services).len(),
            &bookings,
            &ratings,
        )?;
        info!(bookings = metrics.total_bookings, users = metrics.total_users, "General metrics generated");
        Ok(metrics)
    }

    pub async fn sales_trend(
        &self,
        credentials: &Credentials,
        filter: &MetricsFilter,
    ) -> Result<Vec<TrendPoint>> {
        filter.validate()?;

        let fetched = self
            .repository
            .list_bookings(credentials, Some(&filter.booking_filter()), None)
            .await;
        let Some(bookings) = self.primary(EntityKind::Booking, fetched)? else {
            return Ok(Vec::new());
        };

        trends::sales_trend(&bookings, filter.range, filter.group_by)
    }

    pub async fn satisfaction_trend(
        &self,
        credentials: &Credentials,
        filter: &MetricsFilter,
    ) -> Result<Vec<TrendPoint>> {
        filter.validate()?;

        let fetched = self.repository.list_ratings(credentials, None, None).await;
        let Some(ratings) = self.primary(EntityKind::Rating, fetched)? else {
            return Ok(Vec::new());
        };

        trends::satisfaction_trend(&ratings, filter.range, filter.group_by)
    }
}

fn admits_category(filter: &ReportFilter, service: &Service) -> bool {
    filter
        .category_id
        .as_ref()
        .map_or(true, |id| service.category_id() == Some(id))
}

/// Category and provider filters only restrict which services count
fn admits_service(filter: &ReportFilter, service: Option<&Service>) -> bool {
    if filter.category_id.is_none() && filter.provider_id.is_none() {
        return true;
    }
    let Some(service) = service else {
        return false;
    };

    admits_category(filter, service)
        && filter
            .provider_id
            .as_ref()
            .map_or(true, |id| service.provider_id() == Some(id))
}
