use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client as HttpClient, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::marketplace_repository::{EntityKind, MarketplaceRepository};
use crate::config::{CacheConfig, UpstreamConfig};
use crate::core::{AppError, Credentials, Result};
use crate::modules::cache::{BatchLoader, TtlCache};
use crate::modules::marketplace::models::envelope::{decode_list, decode_one};
use crate::modules::marketplace::models::{
    Booking, BookingFilter, BookingLineItem, Category, Client, Comment, EntityId, LineItemFilter,
    Location, Pagination, Payment, Provider, QueryParams, Rating, RatingFilter, Service,
    ServiceFilter,
};

type Query = Vec<(&'static str, String)>;

fn query_of<F: QueryParams>(filter: Option<&F>, page: Option<Pagination>) -> Query {
    let mut pairs = filter.map(QueryParams::query_pairs).unwrap_or_default();
    if let Some(page) = page {
        pairs.extend(page.query_pairs());
    }
    pairs
}

/// Raw HTTP access to the upstream, optionally fronted by a body cache
#[derive(Clone)]
struct HttpFetcher {
    client: HttpClient,
    base_url: Url,
    responses: Option<TtlCache<String, Arc<Vec<u8>>>>,
}

impl HttpFetcher {
    fn url(&self, kind: EntityKind, id: Option<&EntityId>, query: &Query) -> Result<Url> {
        let path = match id {
            Some(id) => format!("{}{}/", kind.path(), id),
            None => kind.path(),
        };
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|e| AppError::internal(format!("Invalid upstream path '{}': {}", path, e)))?;

        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        Ok(url)
    }

    async fn fetch(
        &self,
        credentials: &Credentials,
        kind: EntityKind,
        id: Option<&EntityId>,
        query: Query,
    ) -> Result<Arc<Vec<u8>>> {
        let url = self.url(kind, id, &query)?;
        // Bodies are partitioned per credential, never shared across callers
        let cache_key = format!("{}|{}", credentials.fingerprint(), url);

        if let Some(body) = self.responses.as_ref().and_then(|c| c.get(&cache_key)) {
            debug!(resource = %kind, url = %url, "Upstream cache hit");
            return Ok(body);
        }

        let mut request = self.client.get(url.clone());
        if let Some(value) = credentials.authorization() {
            request = request.header(AUTHORIZATION, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::upstream(kind.name(), e.to_string()))?;

        let status = response.status();
        debug!(resource = %kind, url = %url, status = %status, "Upstream response");

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(AppError::not_found(format!("{} {}", kind, id)));
            }
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(
                kind.name(),
                format!("HTTP {}: {}", status, body.chars().take(200).collect::<String>()),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::upstream(kind.name(), e.to_string()))?;
        let body = Arc::new(body.to_vec());

        if let Some(cache) = &self.responses {
            cache.insert(cache_key, body.clone());
        }

        Ok(body)
    }

    async fn list<T: DeserializeOwned>(
        &self,
        credentials: &Credentials,
        kind: EntityKind,
        query: Query,
    ) -> Result<Vec<T>> {
        let body = self.fetch(credentials, kind, None, query).await?;
        let items: Vec<T> = decode_list(kind.name(), &body)?;
        debug!(resource = %kind, count = items.len(), "Fetched collection");
        Ok(items)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        credentials: &Credentials,
        kind: EntityKind,
        id: &EntityId,
    ) -> Result<T> {
        let body = self.fetch(credentials, kind, Some(id), Vec::new()).await?;
        decode_one(kind.name(), &body)
    }

    async fn services_by_id(
        &self,
        credentials: &Credentials,
        ids: &[EntityId],
    ) -> HashMap<EntityId, Service> {
        let results = join_all(
            ids.iter()
                .map(|id| self.get::<Service>(credentials, EntityKind::Service, id)),
        )
        .await;

        ids.iter()
            .zip(results)
            .filter_map(|(id, result)| match result {
                Ok(service) => Some((id.clone(), service)),
                Err(e) => {
                    warn!(resource = "servicio", id = %id, error = %e, "Service lookup failed");
                    None
                }
            })
            .collect()
    }
}

/// Entity Fetcher backed by the upstream REST API
pub struct RestMarketplaceRepository {
    fetcher: HttpFetcher,
    service_loader: Option<BatchLoader<(String, EntityId), Service>>,
}

impl RestMarketplaceRepository {
    pub fn new(client: HttpClient, upstream: &UpstreamConfig, cache: &CacheConfig) -> Result<Self> {
        let base_url = Url::parse(&upstream.base_url).map_err(|e| {
            AppError::Configuration(format!("Invalid upstream base URL '{}': {}", upstream.base_url, e))
        })?;

        let ttl = Duration::from_secs(cache.ttl_secs);
        let (responses, service_loader) = if cache.enabled {
            (
                Some(TtlCache::new(cache.max_capacity, ttl)),
                Some(BatchLoader::new(cache.max_capacity, ttl)),
            )
        } else {
            (None, None)
        };

        Ok(Self {
            fetcher: HttpFetcher {
                client,
                base_url,
                responses,
            },
            service_loader,
        })
    }
}

#[async_trait]
impl MarketplaceRepository for RestMarketplaceRepository {
    async fn list_services(
        &self,
        credentials: &Credentials,
        filter: Option<&ServiceFilter>,
        page: Option<Pagination>,
    ) -> Result<Vec<Service>> {
        self.fetcher
            .list(credentials, EntityKind::Service, query_of(filter, page))
            .await
    }

    async fn get_service(&self, credentials: &Credentials, id: &EntityId) -> Result<Service> {
        self.fetcher.get(credentials, EntityKind::Service, id).await
    }

    async fn list_providers(
        &self,
        credentials: &Credentials,
        page: Option<Pagination>,
    ) -> Result<Vec<Provider>> {
        self.fetcher
            .list(credentials, EntityKind::Provider, query_of::<Pagination>(None, page))
            .await
    }

    async fn get_provider(&self, credentials: &Credentials, id: &EntityId) -> Result<Provider> {
        self.fetcher.get(credentials, EntityKind::Provider, id).await
    }

    async fn list_clients(
        &self,
        credentials: &Credentials,
        page: Option<Pagination>,
    ) -> Result<Vec<Client>> {
        self.fetcher
            .list(credentials, EntityKind::Client, query_of::<Pagination>(None, page))
            .await
    }

    async fn get_client(&self, credentials: &Credentials, id: &EntityId) -> Result<Client> {
        self.fetcher.get(credentials, EntityKind::Client, id).await
    }

    async fn list_bookings(
        &self,
        credentials: &Credentials,
        filter: Option<&BookingFilter>,
        page: Option<Pagination>,
    ) -> Result<Vec<Booking>> {
        self.fetcher
            .list(credentials, EntityKind::Booking, query_of(filter, page))
            .await
    }

    async fn get_booking(&self, credentials: &Credentials, id: &EntityId) -> Result<Booking> {
        self.fetcher.get(credentials, EntityKind::Booking, id).await
    }

    async fn list_line_items(
        &self,
        credentials: &Credentials,
        filter: Option<&LineItemFilter>,
        page: Option<Pagination>,
    ) -> Result<Vec<BookingLineItem>> {
        self.fetcher
            .list(credentials, EntityKind::LineItem, query_of(filter, page))
            .await
    }

    async fn list_ratings(
        &self,
        credentials: &Credentials,
        filter: Option<&RatingFilter>,
        page: Option<Pagination>,
    ) -> Result<Vec<Rating>> {
        self.fetcher
            .list(credentials, EntityKind::Rating, query_of(filter, page))
            .await
    }

    async fn list_comments(
        &self,
        credentials: &Credentials,
        filter: Option<&RatingFilter>,
        page: Option<Pagination>,
    ) -> Result<Vec<Comment>> {
        self.fetcher
            .list(credentials, EntityKind::Comment, query_of(filter, page))
            .await
    }

    async fn list_payments(
        &self,
        credentials: &Credentials,
        page: Option<Pagination>,
    ) -> Result<Vec<Payment>> {
        self.fetcher
            .list(credentials, EntityKind::Payment, query_of::<Pagination>(None, page))
            .await
    }

    async fn list_locations(
        &self,
        credentials: &Credentials,
        page: Option<Pagination>,
    ) -> Result<Vec<Location>> {
        self.fetcher
            .list(credentials, EntityKind::Location, query_of::<Pagination>(None, page))
            .await
    }

    async fn list_categories(
        &self,
        credentials: &Credentials,
        page: Option<Pagination>,
    ) -> Result<Vec<Category>> {
        self.fetcher
            .list(credentials, EntityKind::Category, query_of::<Pagination>(None, page))
            .await
    }

    async fn get_services(
        &self,
        credentials: &Credentials,
        ids: &[EntityId],
    ) -> Result<HashMap<EntityId, Service>> {
        let Some(loader) = &self.service_loader else {
            return Ok(self.fetcher.services_by_id(credentials, ids).await);
        };

        let fingerprint = credentials.fingerprint();
        let keys: Vec<(String, EntityId)> = ids
            .iter()
            .map(|id| (fingerprint.clone(), id.clone()))
            .collect();

        let fetcher = self.fetcher.clone();
        let credentials = credentials.clone();
        let loaded = loader
            .load_many(&keys, move |misses| async move {
                let ids: Vec<EntityId> = misses.into_iter().map(|(_, id)| id).collect();
                let found = fetcher.services_by_id(&credentials, &ids).await;
                Ok(found
                    .into_iter()
                    .map(|(id, service)| ((credentials.fingerprint(), id), service))
                    .collect())
            })
            .await?;

        Ok(loaded.into_iter().map(|((_, id), service)| (id, service)).collect())
    }

    async fn ping(&self) -> Result<()> {
        let response = self
            .fetcher
            .client
            .get(self.fetcher.base_url.clone())
            .send()
            .await
            .map_err(|e| AppError::upstream("upstream", e.to_string()))?;

        if response.status().is_server_error() {
            return Err(AppError::upstream(
                "upstream",
                format!("HTTP {}", response.status()),
            ));
        }
        Ok(())
    }
}
