// Contract tests for the HTTP reporting surface
//
// Drives the actix app end to end against a wiremock upstream and checks
// the JSON field names, status codes and credential forwarding clients rely on.

#[path = "../helpers/mod.rs"]
mod helpers;

use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::*;
use marketplace_gateway::middleware::query_error_handler;
use marketplace_gateway::modules::health;
use marketplace_gateway::modules::marketplace::MarketplaceRepository;
use marketplace_gateway::modules::reports;

macro_rules! gateway_app {
    ($server:expr) => {{
        let repository: Arc<dyn MarketplaceRepository> = Arc::new(repository($server));
        let service = Arc::new(report_service($server));
        test::init_service(
            App::new()
                .app_data(web::QueryConfig::default().error_handler(query_error_handler))
                .app_data(web::Data::new(repository))
                .app_data(web::Data::new(service))
                .configure(health::configure)
                .configure(reports::controllers::configure),
        )
        .await
    }};
}

async fn three_bookings(server: &MockServer) {
    mount_list(server, "reserva", json!([
        booking_json(1, 1, "2024-01-02", "10.00"),
        booking_json(2, 1, "2024-01-03", "20.00"),
        booking_json(3, 2, "2024-01-04", "15.00")
    ]))
    .await;
    mount_list(server, "reservaServicio", json!([])).await;
}

#[actix_web::test]
async fn test_sales_report_field_names() {
    let server = MockServer::start().await;
    three_bookings(&server).await;
    let app = gateway_app!(&server);

    let req = test::TestRequest::get().uri("/reports/sales").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["totalVentas"], "45.00");
    assert_eq!(body["cantidadReservas"], 3);
    assert_eq!(body["promedioPorReserva"], "15.00");
    assert_eq!(body["periodo"], "all time");
    assert_eq!(body["serviciosMasVendidos"], json!([]));
}

#[actix_web::test]
async fn test_satisfaction_report_field_names() {
    let server = MockServer::start().await;
    mount_list(&server, "calificacion", json!([
        rating_json(1, 4, 5, "2024-01-02"),
        rating_json(2, 4, 3, "2024-01-03")
    ]))
    .await;
    mount_entity(&server, "servicio", 4, service_json(4, "Mudanza", "80.00", 1, 1)).await;
    let app = gateway_app!(&server);

    let req = test::TestRequest::get().uri("/reports/satisfaction").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let report = &body[0];
    assert_eq!(report["servicio"]["nombreServicio"], "Mudanza");
    assert_eq!(report["servicio"]["precio"], "80.00");
    assert_eq!(report["totalCalificaciones"], 2);
    assert_eq!(report["promedioCalificacion"], 4.0);
    assert_eq!(report["distribucionCalificaciones"][0]["puntuacion"], 3);
    assert_eq!(report["distribucionCalificaciones"][0]["porcentaje"], 50.0);
}

#[actix_web::test]
async fn test_malformed_date_is_bad_request() {
    let server = MockServer::start().await;
    let app = gateway_app!(&server);

    let req = test::TestRequest::get()
        .uri("/reports/sales?fechaDesde=2024-13-01")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], 400);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_inverted_range_is_bad_request() {
    let server = MockServer::start().await;
    let app = gateway_app!(&server);

    let req = test::TestRequest::get()
        .uri("/reports/metrics?fechaDesde=2024-02-01&fechaHasta=2024-01-01")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_non_positive_limit_is_bad_request() {
    let server = MockServer::start().await;
    let app = gateway_app!(&server);

    for uri in ["/reports/rankings/services?limit=0", "/reports/rankings/clients?limit=-3"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }

    let req = test::TestRequest::get()
        .uri("/reports/rankings/providers?limit=many")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_upstream_failure_is_bad_gateway() {
    let server = MockServer::start().await;
    mount_status(&server, collection_path("reserva"), 500).await;
    let app = gateway_app!(&server);

    let req = test::TestRequest::get().uri("/reports/sales").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], 502);
    assert!(body["error"]["message"].as_str().unwrap().contains("reserva"));
}

#[actix_web::test]
async fn test_inbound_authorization_reaches_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(collection_path("reserva")))
        .and(header("authorization", "Bearer inbound-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    let app = gateway_app!(&server);

    let req = test::TestRequest::get()
        .uri("/reports/sales")
        .insert_header(("Authorization", "Bearer inbound-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_trend_points_are_dated_strings() {
    let server = MockServer::start().await;
    three_bookings(&server).await;
    let app = gateway_app!(&server);

    let req = test::TestRequest::get()
        .uri("/reports/trends/sales?agruparPor=day")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let points = body.as_array().unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0]["fecha"], "2024-01-02");
    assert_eq!(points[0]["valor"], "10.00");
    assert!(points[0]["etiqueta"].is_string());
}

#[actix_web::test]
async fn test_readiness_follows_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/", API_PREFIX)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    let app = gateway_app!(&server);

    let req = test::TestRequest::get().uri("/ready").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["ready"], true);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
