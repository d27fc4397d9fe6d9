use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketplace_gateway::config::Config;
use marketplace_gateway::middleware::{
    query_error_handler, ErrorHandler, MetricsCollector, MetricsMiddleware, RequestId,
};
use marketplace_gateway::modules::{health, marketplace::MarketplaceRepository, reports};
use marketplace_gateway::modules::marketplace::RestMarketplaceRepository;
use marketplace_gateway::modules::reports::ReportService;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("marketplace_gateway={},actix_web=info", config.app.log_level).into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if config.app.env == "production" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting marketplace reporting gateway");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Upstream API: {}", config.upstream.base_url);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    let client = config
        .upstream
        .build_client()
        .context("Failed to build upstream HTTP client")?;
    let repository: Arc<dyn MarketplaceRepository> = Arc::new(
        RestMarketplaceRepository::new(client, &config.upstream, &config.cache)
            .context("Failed to initialize upstream repository")?,
    );

    tracing::info!(
        enabled = config.cache.enabled,
        ttl_secs = config.cache.ttl_secs,
        "Upstream response cache configured"
    );

    let report_service = Arc::new(ReportService::new(repository.clone(), config.reports.clone()));
    let metrics = MetricsCollector::new();

    let bind_address = config.server.bind_address();
    let workers = config.server.workers;
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
            .max_age(3600);

        App::new()
            .wrap(ErrorHandler)
            .wrap(cors)
            .wrap(MetricsMiddleware::new(metrics.clone(), "/reports"))
            .wrap(RequestId)
            .wrap(TracingLogger::default())
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::Data::new(repository.clone()))
            .app_data(web::Data::new(report_service.clone()))
            .app_data(web::Data::new(metrics.clone()))
            .configure(health::configure)
            .configure(reports::controllers::configure)
            .route("/", web::get().to(index))
    })
    .workers(workers)
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await?;
    Ok(())
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "marketplace-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}
