// Mock upstream wiring: mounts collection/entity bodies and builds the
// repository and report service against the mock's base URL.

use std::sync::Arc;

use marketplace_gateway::config::{CacheConfig, DegradePolicy, ReportConfig, UpstreamConfig};
use marketplace_gateway::modules::marketplace::{MarketplaceRepository, RestMarketplaceRepository};
use marketplace_gateway::modules::reports::ReportService;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_PREFIX: &str = "/api_rest/api/v1";

/// Path of a collection endpoint under the mock, e.g. `reserva` -> `/api_rest/api/v1/reserva/`
pub fn collection_path(resource: &str) -> String {
    format!("{}/{}/", API_PREFIX, resource)
}

pub fn entity_path(resource: &str, id: impl std::fmt::Display) -> String {
    format!("{}/{}/{}/", API_PREFIX, resource, id)
}

pub fn upstream_config(server: &MockServer) -> UpstreamConfig {
    UpstreamConfig::new(format!("{}{}/", server.uri(), API_PREFIX), 5)
}

pub fn cache_enabled() -> CacheConfig {
    CacheConfig {
        enabled: true,
        ttl_secs: 300,
        max_capacity: 1_000,
    }
}

pub fn repository_with(server: &MockServer, cache: CacheConfig) -> RestMarketplaceRepository {
    let upstream = upstream_config(server);
    let client = upstream.build_client().expect("client");
    RestMarketplaceRepository::new(client, &upstream, &cache).expect("repository")
}

pub fn repository(server: &MockServer) -> RestMarketplaceRepository {
    repository_with(server, CacheConfig::default())
}

pub fn report_service_with(server: &MockServer, policy: DegradePolicy, default_limit: usize) -> ReportService {
    let repository: Arc<dyn MarketplaceRepository> = Arc::new(repository(server));
    ReportService::new(
        repository,
        ReportConfig {
            degrade_policy: policy,
            default_limit,
        },
    )
}

pub fn report_service(server: &MockServer) -> ReportService {
    report_service_with(server, DegradePolicy::Propagate, 10)
}

/// Serve `body` for GET on a collection, whatever the query string
pub async fn mount_list(server: &MockServer, resource: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(collection_path(resource)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_entity(server: &MockServer, resource: &str, id: impl std::fmt::Display, body: Value) {
    Mock::given(method("GET"))
        .and(path(entity_path(resource, id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, request_path: String, status: u16) {
    Mock::given(method("GET"))
        .and(path(request_path))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream failure"))
        .mount(server)
        .await;
}

/// Empty lists for every collection not mounted explicitly.
/// Mount this last: wiremock tries mocks in registration order.
pub async fn mount_empty_collections(server: &MockServer, resources: &[&str]) {
    for resource in resources {
        mount_list(server, resource, Value::Array(Vec::new())).await;
    }
}
