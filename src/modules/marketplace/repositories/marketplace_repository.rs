use async_trait::async_trait;
use futures_util::future::join_all;
use std::collections::HashMap;
use std::fmt;

use crate::core::{Credentials, Result};
use crate::modules::marketplace::models::{
    Booking, BookingFilter, BookingLineItem, Category, Client, Comment, EntityId, LineItemFilter, Location,
    Pagination, Payment, Provider, Rating, RatingFilter, Service, ServiceFilter,
};

/// Entity kinds exposed by the upstream REST API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Service,
    Provider,
    Client,
    Booking,
    LineItem,
    Rating,
    Comment,
    Payment,
    Location,
    Category,
}

impl EntityKind {
    /// Upstream resource name, also used in error messages and logs
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Service => "servicio",
            EntityKind::Provider => "proveedor",
            EntityKind::Client => "cliente",
            EntityKind::Booking => "reserva",
            EntityKind::LineItem => "reservaServicio",
            EntityKind::Rating => "calificacion",
            EntityKind::Comment => "comentario",
            EntityKind::Payment => "pago",
            EntityKind::Location => "ubicacion",
            EntityKind::Category => "categoria",
        }
    }

    /// Collection path relative to the base URL
    pub fn path(&self) -> String {
        format!("{}/", self.name())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Entity Fetcher: typed list/get access to the upstream marketplace.
///
/// Every call carries the caller's credentials so the upstream sees the
/// same `Authorization` as the inbound request. Failures are returned as
/// is; nothing here retries.
#[async_trait]
pub trait MarketplaceRepository: Send + Sync {
    async fn list_services(
        &self,
        credentials: &Credentials,
        filter: Option<&ServiceFilter>,
        page: Option<Pagination>,
    ) -> Result<Vec<Service>>;

    async fn get_service(&self, credentials: &Credentials, id: &EntityId) -> Result<Service>;

    async fn list_providers(
        &self,
        credentials: &Credentials,
        page: Option<Pagination>,
    ) -> Result<Vec<Provider>>;

    async fn get_provider(&self, credentials: &Credentials, id: &EntityId) -> Result<Provider>;

    async fn list_clients(
        &self,
        credentials: &Credentials,
        page: Option<Pagination>,
    ) -> Result<Vec<Client>>;

    async fn get_client(&self, credentials: &Credentials, id: &EntityId) -> Result<Client>;

    async fn list_bookings(
        &self,
        credentials: &Credentials,
        filter: Option<&BookingFilter>,
        page: Option<Pagination>,
    ) -> Result<Vec<Booking>>;

    async fn get_booking(&self, credentials: &Credentials, id: &EntityId) -> Result<Booking>;

    async fn list_line_items(
        &self,
        credentials: &Credentials,
        filter: Option<&LineItemFilter>,
        page: Option<Pagination>,
    ) -> Result<Vec<BookingLineItem>>;

    async fn list_ratings(
        &self,
        credentials: &Credentials,
        filter: Option<&RatingFilter>,
        page: Option<Pagination>,
    ) -> Result<Vec<Rating>>;

    async fn list_comments(
        &self,
        credentials: &Credentials,
        filter: Option<&RatingFilter>,
        page: Option<Pagination>,
    ) -> Result<Vec<Comment>>;

    async fn list_payments(
        &self,
        credentials: &Credentials,
        page: Option<Pagination>,
    ) -> Result<Vec<Payment>>;

    async fn list_locations(
        &self,
        credentials: &Credentials,
        page: Option<Pagination>,
    ) -> Result<Vec<Location>>;

    async fn list_categories(
        &self,
        credentials: &Credentials,
        page: Option<Pagination>,
    ) -> Result<Vec<Category>>;

    /// Resolve several services at once. Ids that fail to load are left out.
    async fn get_services(
        &self,
        credentials: &Credentials,
        ids: &[EntityId],
    ) -> Result<HashMap<EntityId, Service>> {
        let results = join_all(ids.iter().map(|id| self.get_service(credentials, id))).await;

        Ok(ids
            .iter()
            .zip(results)
            .filter_map(|(id, result)| match result {
                Ok(service) => Some((id.clone(), service)),
                Err(e) => {
                    tracing::warn!(resource = "servicio", id = %id, error = %e, "Service lookup failed");
                    None
                }
            })
            .collect())
    }

    /// Whether the upstream answers at all
    async fn ping(&self) -> Result<()>;
}
