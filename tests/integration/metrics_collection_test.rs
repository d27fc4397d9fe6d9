// Integration tests for query metrics collection
//
// Runs report requests through the metrics middleware against a wiremock
// upstream and reads the counters back from GET /metrics.

#[path = "../helpers/mod.rs"]
mod helpers;

use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};
use wiremock::MockServer;

use helpers::*;
use marketplace_gateway::middleware::{query_error_handler, MetricsCollector, MetricsMiddleware, RequestId};
use marketplace_gateway::modules::health;
use marketplace_gateway::modules::marketplace::MarketplaceRepository;
use marketplace_gateway::modules::reports;

macro_rules! metered_app {
    ($server:expr, $collector:expr) => {{
        let repository: Arc<dyn MarketplaceRepository> = Arc::new(repository($server));
        let service = Arc::new(report_service($server));
        test::init_service(
            App::new()
                .wrap(MetricsMiddleware::new($collector.clone(), "/reports"))
                .wrap(RequestId)
                .app_data(web::QueryConfig::default().error_handler(query_error_handler))
                .app_data(web::Data::new(repository))
                .app_data(web::Data::new(service))
                .app_data(web::Data::new($collector.clone()))
                .configure(health::configure)
                .configure(reports::controllers::configure),
        )
        .await
    }};
}

#[actix_web::test]
async fn test_report_queries_are_counted_by_status_and_route() {
    let server = MockServer::start().await;
    mount_list(&server, "reserva", json!([booking_json(1, 1, "2024-01-02", "10.00")])).await;
    mount_list(&server, "reservaServicio", json!([])).await;
    let collector = MetricsCollector::new();
    let app = metered_app!(&server, collector);

    for (uri, expected) in [
        ("/reports/sales", StatusCode::OK),
        ("/reports/sales?fechaDesde=2024-13-01", StatusCode::BAD_REQUEST),
        ("/reports/rankings/services?limit=0", StatusCode::BAD_REQUEST),
        ("/health", StatusCode::OK),
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected, "{}", uri);
    }

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["total_requests"], 3);
    assert_eq!(body["successful_requests"], 1);
    assert_eq!(body["client_errors"], 2);
    assert_eq!(body["server_errors"], 0);
    assert_eq!(body["recent_queries"], 3);
    assert_eq!(body["endpoint_counts"]["/reports/sales"], 2);
    assert_eq!(body["endpoint_counts"]["/reports/rankings/services"], 1);
    assert_eq!(body["endpoint_errors"]["/reports/sales"], 1);
    assert!(body["endpoint_counts"].get("/health").is_none());

    let error_rate = body["error_rate"].as_f64().unwrap();
    assert!((error_rate - 66.67).abs() < 0.01);
}

#[actix_web::test]
async fn test_upstream_failure_counts_as_server_error() {
    let server = MockServer::start().await;
    mount_status(&server, collection_path("reserva"), 500).await;
    let collector = MetricsCollector::new();
    let app = metered_app!(&server, collector);

    let req = test::TestRequest::get().uri("/reports/sales").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let metrics = collector.get_metrics();
    assert_eq!(metrics.total_requests, 1);
    assert_eq!(metrics.server_errors, 1);
    assert_eq!(metrics.error_rate, 100.0);
    assert_eq!(metrics.success_rate, 0.0);
}

#[actix_web::test]
async fn test_metrics_start_empty() {
    let server = MockServer::start().await;
    let collector = MetricsCollector::new();
    let app = metered_app!(&server, collector);

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["total_requests"], 0);
    assert_eq!(body["avg_response_time_ms"], 0);
    assert_eq!(body["error_rate"], 0.0);
}
