// Query metrics for the reporting endpoints
//
// Tracks, for requests under a path prefix:
// - Request counts by status class and by route
// - Min/max response time over the process lifetime
// - Average response time and error rate over the most recent queries

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use super::request_id::RequestIdentifier;

/// Samples kept for the windowed average and error rate
pub const RECENT_QUERY_LIMIT: usize = 1000;

const UNMATCHED_ROUTE: &str = "unmatched";

/// Shared store behind the middleware and `GET /metrics`
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    data: Arc<Mutex<MetricsData>>,
}

#[derive(Debug)]
struct QuerySample {
    duration_ms: u64,
    failed: bool,
}

#[derive(Debug, Default)]
struct MetricsData {
    total_requests: u64,
    successful_requests: u64,
    client_errors: u64,
    server_errors: u64,
    min_response_time_ms: Option<u64>,
    max_response_time_ms: u64,
    endpoint_counts: HashMap<String, u64>,
    endpoint_errors: HashMap<String, u64>,
    recent: VecDeque<QuerySample>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> MutexGuard<'_, MetricsData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one finished query
    pub fn record(&self, route: &str, status_code: u16, response_time_ms: u64) {
        let mut data = self.data();
        let failed = status_code >= 400;

        data.total_requests += 1;
        match status_code {
            200..=299 => data.successful_requests += 1,
            400..=499 => data.client_errors += 1,
            500..=599 => data.server_errors += 1,
            _ => {}
        }

        data.min_response_time_ms = Some(
            data.min_response_time_ms
                .map_or(response_time_ms, |min| min.min(response_time_ms)),
        );
        data.max_response_time_ms = data.max_response_time_ms.max(response_time_ms);

        *data.endpoint_counts.entry(route.to_string()).or_insert(0) += 1;
        if failed {
            *data.endpoint_errors.entry(route.to_string()).or_insert(0) += 1;
        }

        if data.recent.len() == RECENT_QUERY_LIMIT {
            data.recent.pop_front();
        }
        data.recent.push_back(QuerySample {
            duration_ms: response_time_ms,
            failed,
        });
    }

    /// Current snapshot
    pub fn get_metrics(&self) -> Metrics {
        let data = self.data();
        let window = data.recent.len() as u64;

        let (avg_response_time_ms, error_rate) = if window > 0 {
            let total_ms: u64 = data.recent.iter().map(|s| s.duration_ms).sum();
            let errors = data.recent.iter().filter(|s| s.failed).count() as f64;
            (total_ms / window, errors / window as f64 * 100.0)
        } else {
            (0, 0.0)
        };

        let success_rate = if data.total_requests > 0 {
            data.successful_requests as f64 / data.total_requests as f64 * 100.0
        } else {
            0.0
        };

        Metrics {
            total_requests: data.total_requests,
            successful_requests: data.successful_requests,
            client_errors: data.client_errors,
            server_errors: data.server_errors,
            recent_queries: data.recent.len(),
            avg_response_time_ms,
            min_response_time_ms: data.min_response_time_ms.unwrap_or(0),
            max_response_time_ms: data.max_response_time_ms,
            error_rate,
            success_rate,
            endpoint_counts: data.endpoint_counts.clone(),
            endpoint_errors: data.endpoint_errors.clone(),
        }
    }
}

/// Metrics snapshot served at `GET /metrics`
#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    /// Size of the window `avg_response_time_ms` and `error_rate` cover
    pub recent_queries: usize,
    pub avg_response_time_ms: u64,
    pub min_response_time_ms: u64,
    pub max_response_time_ms: u64,
    /// Percentage of failed queries in the recent window
    pub error_rate: f64,
    pub success_rate: f64,
    pub endpoint_counts: HashMap<String, u64>,
    pub endpoint_errors: HashMap<String, u64>,
}

/// Times every request whose path starts with `prefix` and records it in
/// the collector, keyed by the matched route pattern.
pub struct MetricsMiddleware {
    collector: MetricsCollector,
    prefix: Rc<str>,
}

impl MetricsMiddleware {
    pub fn new(collector: MetricsCollector, prefix: &str) -> Self {
        Self {
            collector,
            prefix: Rc::from(prefix),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
            collector: self.collector.clone(),
            prefix: self.prefix.clone(),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
    collector: MetricsCollector,
    prefix: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !req.path().starts_with(&*self.prefix) {
            return Box::pin(self.service.call(req));
        }

        let svc = self.service.clone();
        let collector = self.collector.clone();
        let start_time = Instant::now();
        let request_id = req
            .extensions()
            .get::<RequestIdentifier>()
            .map(|id| id.0.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let route = req
            .match_pattern()
            .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

        Box::pin(async move {
            let result = svc.call(req).await;
            let response_time_ms = start_time.elapsed().as_millis() as u64;

            let status = match &result {
                Ok(response) => response.status(),
                Err(err) => err.as_response_error().status_code(),
            };
            collector.record(&route, status.as_u16(), response_time_ms);

            tracing::debug!(
                request_id = %request_id,
                route = %route,
                status = status.as_u16(),
                response_time_ms = response_time_ms,
                "Query recorded"
            );

            result
        })
    }
}
