// Integration tests for report generation against a mock upstream
//
// Covers the end-to-end sales/satisfaction scenarios, provider and client
// reports, metrics, trends, the degrade policy and reference reconciliation.

#[path = "../helpers/mod.rs"]
mod helpers;

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::*;
use marketplace_gateway::config::DegradePolicy;
use marketplace_gateway::core::{AppError, Credentials};
use marketplace_gateway::modules::marketplace::EntityId;
use marketplace_gateway::modules::reports::models::{
    DateRange, GroupBy, MetricsFilter, ReportFilter,
};

fn january() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 1, 1),
        NaiveDate::from_ymd_opt(2024, 1, 31),
    )
}

#[tokio::test]
async fn test_sales_report_totals_three_bookings() {
    let server = MockServer::start().await;
    mount_list(&server, "reserva", json!([
        booking_json(1, 1, "2024-01-02", "10.00"),
        booking_json(2, 1, "2024-01-03", "20.00"),
        booking_json(3, 2, "2024-01-04", "15.00")
    ]))
    .await;
    mount_list(&server, "reservaServicio", json!([])).await;

    let report = report_service(&server)
        .sales_report(&Credentials::anonymous(), &ReportFilter::default())
        .await
        .unwrap();

    assert_eq!(report.total_sales, dec!(45.00));
    assert_eq!(report.booking_count, 3);
    assert_eq!(report.average_per_booking, dec!(15.00));
    assert_eq!(report.period, "all time");
    assert!(report.top_services.is_empty());
}

#[tokio::test]
async fn test_satisfaction_report_distribution() {
    let server = MockServer::start().await;
    mount_list(&server, "calificacion", json!([
        rating_json(1, 4, 5, "2024-01-02"),
        rating_json(2, 4, 5, "2024-01-03"),
        rating_json(3, 4, 3, "2024-01-04"),
        rating_json(4, 4, 1, "2024-01-05")
    ]))
    .await;
    mount_entity(&server, "servicio", 4, service_json(4, "Mudanza", "80.00", 1, 1)).await;

    let reports = report_service(&server)
        .satisfaction_report(&Credentials::anonymous(), &ReportFilter::default())
        .await
        .unwrap();

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.service.name, "Mudanza");
    assert_eq!(report.total_ratings, 4);
    assert_eq!(report.average_rating, 3.5);

    let shares: Vec<(i64, i64, f64)> = report
        .distribution
        .iter()
        .map(|s| (s.score, s.count, s.percentage))
        .collect();
    assert_eq!(shares, vec![(1, 1, 25.0), (3, 1, 25.0), (5, 2, 50.0)]);
}

#[tokio::test]
async fn test_satisfaction_report_orders_by_average() {
    let server = MockServer::start().await;
    mount_list(&server, "calificacion", json!([
        rating_json(1, 1, 3, "2024-01-02"),
        rating_json(2, 2, 5, "2024-01-03")
    ]))
    .await;
    mount_entity(&server, "servicio", 1, service_json(1, "Pintura", "10.00", 1, 1)).await;
    mount_entity(&server, "servicio", 2, service_json(2, "Poda", "12.00", 1, 1)).await;

    let reports = report_service(&server)
        .satisfaction_report(&Credentials::anonymous(), &ReportFilter::default())
        .await
        .unwrap();

    let names: Vec<&str> = reports.iter().map(|r| r.service.name.as_str()).collect();
    assert_eq!(names, vec!["Poda", "Pintura"]);
}

#[tokio::test]
async fn test_revenue_falls_back_to_service_price() {
    let server = MockServer::start().await;
    mount_list(&server, "reserva", json!([
        booking_with_items(1, 1, "2024-01-02", "19.98", json!([
            line_item_json(7, 2, "0", "0")
        ]))
    ]))
    .await;
    mount_entity(&server, "servicio", 7, service_json(7, "Limpieza", "9.99", 1, 1)).await;

    let report = report_service(&server)
        .sales_report(&Credentials::anonymous(), &ReportFilter::default())
        .await
        .unwrap();

    assert_eq!(report.top_services.len(), 1);
    let sold = &report.top_services[0];
    assert_eq!(sold.service.name, "Limpieza");
    assert_eq!(sold.quantity_sold, 2);
    assert_eq!(sold.revenue, dec!(19.98));
}

#[tokio::test]
async fn test_most_popular_top_two_of_five() {
    let server = MockServer::start().await;
    let item = |service: i64, quantity: i64| {
        json!({
            "servicio": service_json(service, &format!("Servicio {}", service), "5.00", 1, 1),
            "cantidad": quantity
        })
    };
    mount_list(&server, "reserva", json!([
        booking_with_items(1, 1, "2024-01-02", "50.00", json!([item(1, 3), item(2, 8), item(3, 1)])),
        booking_with_items(2, 1, "2024-01-03", "40.00", json!([item(4, 6), item(5, 2), item(3, 1)]))
    ]))
    .await;

    let top = report_service(&server)
        .most_popular_services(&Credentials::anonymous(), Some(2))
        .await
        .unwrap();

    assert_eq!(top.len(), 2);
    assert_eq!(top[0].service.id, EntityId::from(2));
    assert_eq!(top[0].quantity_sold, 8);
    assert_eq!(top[1].service.id, EntityId::from(4));
    assert_eq!(top[1].quantity_sold, 6);
}

#[tokio::test]
async fn test_each_service_reference_is_fetched_once() {
    let server = MockServer::start().await;
    mount_list(&server, "reserva", json!([
        booking_with_items(1, 1, "2024-01-02", "10.00", json!([line_item_json(5, 1, "10.00", "10.00")])),
        booking_with_items(2, 2, "2024-01-03", "20.00", json!([line_item_json(5, 2, "10.00", "20.00")]))
    ]))
    .await;
    Mock::given(method("GET"))
        .and(path(entity_path("servicio", 5)))
        .respond_with(ResponseTemplate::new(200).set_body_json(service_json(5, "Jardineria", "10.00", 1, 1)))
        .expect(1)
        .mount(&server)
        .await;

    let report = report_service(&server)
        .sales_report(&Credentials::anonymous(), &ReportFilter::default())
        .await
        .unwrap();

    assert_eq!(report.top_services[0].quantity_sold, 3);
    assert_eq!(report.top_services[0].revenue, dec!(30.00));
}

#[tokio::test]
async fn test_unresolved_service_keeps_raw_id() {
    let server = MockServer::start().await;
    mount_list(&server, "reserva", json!([
        booking_with_items(1, 1, "2024-01-02", "12.00", json!([line_item_json(42, 1, "12.00", "12.00")]))
    ]))
    .await;
    mount_status(&server, entity_path("servicio", 42), 404).await;

    let report = report_service(&server)
        .sales_report(&Credentials::anonymous(), &ReportFilter::default())
        .await
        .unwrap();

    let sold = &report.top_services[0];
    assert_eq!(sold.service.name, "42");
    assert_eq!(sold.revenue, dec!(12.00));
    assert_eq!(report.total_sales, dec!(12.00));
}

#[tokio::test]
async fn test_sales_filters_dates_client_side_and_categories_per_item() {
    let server = MockServer::start().await;
    mount_list(&server, "reserva", json!([
        booking_with_items(1, 1, "2024-01-05", "30.00", json!([
            {"servicio": service_json(1, "Pintura", "10.00", 1, 1), "cantidad": 1},
            {"servicio": service_json(2, "Poda", "20.00", 1, 2), "cantidad": 1}
        ])),
        booking_with_items(2, 1, "2024-02-05", "99.00", json!([
            {"servicio": service_json(2, "Poda", "20.00", 1, 2), "cantidad": 4}
        ]))
    ]))
    .await;

    let filter = ReportFilter {
        range: january(),
        category_id: Some(EntityId::from(2)),
        ..Default::default()
    };
    let report = report_service(&server)
        .sales_report(&Credentials::anonymous(), &filter)
        .await
        .unwrap();

    assert_eq!(report.period, "2024-01-01 to 2024-01-31");
    assert_eq!(report.booking_count, 1);
    assert_eq!(report.total_sales, dec!(30.00));
    assert_eq!(report.top_services.len(), 1);
    assert_eq!(report.top_services[0].service.name, "Poda");
    assert_eq!(report.top_services[0].quantity_sold, 1);
}

#[tokio::test]
async fn test_fallback_line_items_default_to_one_unit() {
    let server = MockServer::start().await;
    mount_list(&server, "reserva", json!([booking_json(1, 1, "2024-01-02", "20.00")])).await;
    mount_list(&server, "reservaServicio", json!([
        {"reserva": 1, "servicio": service_json(10, "Gasfiteria", "20.00", 1, 1)},
        {"reserva": 99, "servicio": service_json(10, "Gasfiteria", "20.00", 1, 1), "cantidad": 5}
    ]))
    .await;

    let report = report_service(&server)
        .sales_report(&Credentials::anonymous(), &ReportFilter::default())
        .await
        .unwrap();

    assert_eq!(report.top_services.len(), 1);
    assert_eq!(report.top_services[0].quantity_sold, 1);
    assert_eq!(report.top_services[0].revenue, dec!(20.00));
}

#[tokio::test]
async fn test_primary_failure_propagates_by_default() {
    let server = MockServer::start().await;
    mount_status(&server, collection_path("reserva"), 500).await;

    let err = report_service(&server)
        .sales_report(&Credentials::anonymous(), &ReportFilter::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UpstreamUnavailable { .. }));
}

#[tokio::test]
async fn test_primary_failure_zero_values_when_configured() {
    let server = MockServer::start().await;
    mount_status(&server, collection_path("reserva"), 502).await;
    mount_status(&server, collection_path("cliente"), 502).await;

    let service = report_service_with(&server, DegradePolicy::ZeroValue, 10);
    let creds = Credentials::anonymous();

    let report = service.sales_report(&creds, &ReportFilter::default()).await.unwrap();
    assert_eq!(report.total_sales, dec!(0));
    assert_eq!(report.booking_count, 0);
    assert!(report.top_services.is_empty());

    let clients = service.client_report(&creds, &ReportFilter::default()).await.unwrap();
    assert!(clients.is_empty());

    let trend = service.sales_trend(&creds, &MetricsFilter::default()).await.unwrap();
    assert!(trend.is_empty());
}

#[tokio::test]
async fn test_inverted_range_is_rejected_before_fetching() {
    let server = MockServer::start().await;

    let filter = ReportFilter {
        range: DateRange::new(NaiveDate::from_ymd_opt(2024, 2, 1), NaiveDate::from_ymd_opt(2024, 1, 1)),
        ..Default::default()
    };
    let err = report_service(&server)
        .sales_report(&Credentials::anonymous(), &filter)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

async fn mount_provider_fixture(server: &MockServer) {
    mount_list(server, "proveedor", json!([
        provider_json(1, "Servicios Sol", "Quito"),
        provider_json(2, "Luna Hogar", "Cuenca")
    ]))
    .await;
    mount_list(server, "servicio", json!([
        service_json(10, "Pintura", "20.00", 1, 1),
        service_json(11, "Poda", "30.00", 1, 2),
        service_json(12, "Mudanza", "50.00", 2, 1)
    ]))
    .await;
    mount_list(server, "reservaServicio", json!([
        {"reserva": 1, "servicio": 10, "cantidad": 2},
        {"reserva": 2, "servicio": 12}
    ]))
    .await;
}

#[tokio::test]
async fn test_provider_report_aggregates_services() {
    let server = MockServer::start().await;
    mount_provider_fixture(&server).await;
    mount_list(&server, "calificacion", json!([
        rating_json(1, 10, 4, "2024-01-02"),
        rating_json(2, 11, 2, "2024-01-03"),
        rating_json(3, 12, 5, "2024-01-04")
    ]))
    .await;

    let reports = report_service(&server)
        .provider_report(&Credentials::anonymous(), &ReportFilter::default())
        .await
        .unwrap();

    assert_eq!(reports.len(), 2);

    let luna = &reports[0];
    assert_eq!(luna.provider.name, "Luna Hogar");
    assert_eq!(luna.total_revenue, dec!(50.00));
    assert_eq!(luna.total_services, 1);
    assert_eq!(luna.average_rating, 5.0);

    let sol = &reports[1];
    assert_eq!(sol.provider.name, "Servicios Sol");
    assert_eq!(sol.total_services, 2);
    assert_eq!(sol.active_services, 1);
    assert_eq!(sol.total_revenue, dec!(40.00));
    assert_eq!(sol.average_rating, 3.0);
}

#[tokio::test]
async fn test_provider_report_survives_ratings_failure() {
    let server = MockServer::start().await;
    mount_provider_fixture(&server).await;
    mount_status(&server, collection_path("calificacion"), 500).await;

    let filter = ReportFilter {
        city: Some("quito".to_string()),
        ..Default::default()
    };
    let reports = report_service(&server)
        .provider_report(&Credentials::anonymous(), &filter)
        .await
        .unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].provider.name, "Servicios Sol");
    assert_eq!(reports[0].total_revenue, dec!(40.00));
    assert_eq!(reports[0].average_rating, 0.0);
}

async fn mount_client_fixture(server: &MockServer) {
    mount_list(server, "cliente", json!([
        client_json(1, "Ana", "ana@example.com"),
        client_json(2, "Beto", "beto@example.com")
    ]))
    .await;
    mount_list(server, "reserva", json!([
        booking_json(1, 1, "2024-01-05", "10.00"),
        booking_json(2, 1, "2024-02-01", "30.00"),
        booking_json(3, 3, "2024-01-20", "5.00")
    ]))
    .await;
    mount_entity(server, "cliente", 3, client_json(3, "Carla", "carla@example.com")).await;
}

#[tokio::test]
async fn test_client_report_orders_by_spend_and_completes_missing_clients() {
    let server = MockServer::start().await;
    mount_client_fixture(&server).await;

    let reports = report_service(&server)
        .client_report(&Credentials::anonymous(), &ReportFilter::default())
        .await
        .unwrap();

    let names: Vec<&str> = reports.iter().map(|r| r.client.name.as_str()).collect();
    assert_eq!(names, vec!["Ana", "Carla", "Beto"]);

    assert_eq!(reports[0].total_bookings, 2);
    assert_eq!(reports[0].total_spend, dec!(40.00));
    assert_eq!(reports[0].average_spend, dec!(20.00));
    assert_eq!(reports[0].last_booking, NaiveDate::from_ymd_opt(2024, 2, 1));
    assert_eq!(reports[2].last_booking, None);
}

#[tokio::test]
async fn test_most_active_clients_limit() {
    let server = MockServer::start().await;
    mount_client_fixture(&server).await;

    let ranked = report_service(&server)
        .most_active_clients(&Credentials::anonymous(), Some(2))
        .await
        .unwrap();

    let names: Vec<&str> = ranked.iter().map(|r| r.client.name.as_str()).collect();
    assert_eq!(names, vec!["Ana", "Carla"]);
}

#[tokio::test]
async fn test_general_metrics_respects_range() {
    let server = MockServer::start().await;
    mount_client_fixture(&server).await;
    mount_list(&server, "proveedor", json!([
        provider_json(1, "Servicios Sol", "Quito"),
        provider_json(2, "Luna Hogar", "Cuenca")
    ]))
    .await;
    mount_list(&server, "servicio", json!([
        service_json(10, "Pintura", "20.00", 1, 1),
        service_json(11, "Poda", "30.00", 1, 2),
        service_json(12, "Mudanza", "50.00", 2, 1)
    ]))
    .await;
    mount_list(&server, "calificacion", json!([
        rating_json(1, 10, 4, "2024-01-10"),
        rating_json(2, 11, 2, "2024-02-10")
    ]))
    .await;

    let filter = MetricsFilter {
        range: january(),
        group_by: GroupBy::Day,
    };
    let metrics = report_service(&server)
        .general_metrics(&Credentials::anonymous(), &filter)
        .await
        .unwrap();

    assert_eq!(metrics.total_users, 4);
    assert_eq!(metrics.total_clients, 2);
    assert_eq!(metrics.total_providers, 2);
    assert_eq!(metrics.total_services, 3);
    assert_eq!(metrics.total_bookings, 2);
    assert_eq!(metrics.total_revenue, dec!(15.00));
    assert_eq!(metrics.average_satisfaction, 4.0);
}

#[tokio::test]
async fn test_monthly_sales_trend() {
    let server = MockServer::start().await;
    mount_client_fixture(&server).await;

    let filter = MetricsFilter {
        range: DateRange::default(),
        group_by: GroupBy::Month,
    };
    let trend = report_service(&server)
        .sales_trend(&Credentials::anonymous(), &filter)
        .await
        .unwrap();

    assert_eq!(trend.len(), 2);
    assert_eq!(trend[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(trend[0].value, dec!(15.00));
    assert_eq!(trend[0].label, "January 2024");
    assert_eq!(trend[1].value, dec!(30.00));
}

#[tokio::test]
async fn test_sales_past_decimal_range_fail_with_decode_mismatch() {
    let server = MockServer::start().await;
    mount_list(&server, "reserva", json!([
        booking_with_items(1, 1, "2024-01-02", "0", json!([
            line_item_json(1, 10_000_000_000, "99999999999999999999", "0")
        ]))
    ]))
    .await;
    mount_entity(&server, "servicio", 1, service_json(1, "Limpieza", "10.00", 1, 1)).await;

    let result = report_service_with(&server, DegradePolicy::ZeroValue, 10)
        .sales_report(&Credentials::anonymous(), &ReportFilter::default())
        .await;

    assert!(matches!(
        result,
        Err(AppError::DecodeMismatch { ref resource, .. }) if resource == "reservaServicio"
    ));
}
