use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::error::AppError;
use crate::core::scalars::{format_date, format_money, parse_date};
use crate::core::{Credentials, Result};
use crate::modules::marketplace::EntityId;
use crate::modules::reports::models::{
    ClientReport, ClientSummary, DateRange, GeneralMetrics, GroupBy, MetricsFilter,
    ProviderReport, ProviderSummary, ReportFilter, SalesReport, SatisfactionReport, ScoreShare,
    ServiceSold, ServiceSummary, TrendPoint,
};
use crate::modules::reports::services::ReportService;

/// Query parameters shared by the sales, satisfaction, provider and client reports
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub fecha_desde: Option<String>,
    pub fecha_hasta: Option<String>,
    pub categoria_id: Option<String>,
    pub proveedor_id: Option<String>,
    pub ciudad: Option<String>,
    pub estado_reserva: Option<String>,
}

/// Query parameters for the metrics and trend endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsQuery {
    pub fecha_desde: Option<String>,
    pub fecha_hasta: Option<String>,
    pub agrupar_por: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn date_param(name: &str, value: Option<&String>) -> Result<Option<NaiveDate>> {
    match non_blank(value) {
        None => Ok(None),
        Some(raw) => parse_date(raw).map(Some).ok_or_else(|| {
            AppError::validation(format!("Invalid {}: '{}'. Expected YYYY-MM-DD", name, raw))
        }),
    }
}

fn range_of(from: Option<&String>, to: Option<&String>) -> Result<DateRange> {
    let range = DateRange::new(date_param("fechaDesde", from)?, date_param("fechaHasta", to)?);
    range.validate()?;
    Ok(range)
}

impl TryFrom<ReportQuery> for ReportFilter {
    type Error = AppError;

    fn try_from(query: ReportQuery) -> Result<Self> {
        Ok(Self {
            range: range_of(query.fecha_desde.as_ref(), query.fecha_hasta.as_ref())?,
            category_id: non_blank(query.categoria_id.as_ref()).map(EntityId::from),
            provider_id: non_blank(query.proveedor_id.as_ref()).map(EntityId::from),
            city: non_blank(query.ciudad.as_ref()).map(str::to_string),
            booking_status: non_blank(query.estado_reserva.as_ref()).map(str::to_string),
        })
    }
}

impl TryFrom<MetricsQuery> for MetricsFilter {
    type Error = AppError;

    fn try_from(query: MetricsQuery) -> Result<Self> {
        let group_by = match non_blank(query.agrupar_por.as_ref()) {
            Some(raw) => raw.parse::<GroupBy>()?,
            None => GroupBy::default(),
        };

        Ok(Self {
            range: range_of(query.fecha_desde.as_ref(), query.fecha_hasta.as_ref())?,
            group_by,
        })
    }
}

impl LimitQuery {
    pub fn resolve(&self) -> Result<Option<usize>> {
        match self.limit {
            None => Ok(None),
            Some(limit) if limit <= 0 => Err(AppError::validation(format!(
                "limit must be greater than 0, got {}",
                limit
            ))),
            Some(limit) => Ok(Some(limit as usize)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ServiceSummaryResponse {
    pub id: EntityId,
    #[serde(rename = "nombreServicio")]
    pub name: String,
    #[serde(rename = "precio")]
    pub price: String,
}

#[derive(Debug, Serialize)]
pub struct ProviderSummaryResponse {
    pub id: EntityId,
    #[serde(rename = "nombre")]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ClientSummaryResponse {
    pub id: EntityId,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSoldResponse {
    #[serde(rename = "servicio")]
    pub service: ServiceSummaryResponse,
    pub cantidad_vendida: i64,
    pub ingresos_generados: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReportResponse {
    pub periodo: String,
    pub total_ventas: String,
    pub cantidad_reservas: i64,
    pub promedio_por_reserva: String,
    pub servicios_mas_vendidos: Vec<ServiceSoldResponse>,
}

#[derive(Debug, Serialize)]
pub struct ScoreShareResponse {
    pub puntuacion: i64,
    pub cantidad: i64,
    pub porcentaje: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SatisfactionReportResponse {
    #[serde(rename = "servicio")]
    pub service: ServiceSummaryResponse,
    pub total_calificaciones: i64,
    pub promedio_calificacion: f64,
    pub distribucion_calificaciones: Vec<ScoreShareResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderReportResponse {
    #[serde(rename = "proveedor")]
    pub provider: ProviderSummaryResponse,
    pub total_servicios: i64,
    pub servicios_activos: i64,
    pub ingresos_totales: String,
    pub promedio_calificacion: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientReportResponse {
    #[serde(rename = "cliente")]
    pub client: ClientSummaryResponse,
    pub total_reservas: i64,
    pub gasto_total: String,
    pub promedio_gasto: String,
    pub ultima_reserva: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralMetricsResponse {
    pub total_usuarios: i64,
    pub total_clientes: i64,
    pub total_proveedores: i64,
    pub total_servicios: i64,
    pub total_reservas: i64,
    pub ingresos_totales: String,
    pub promedio_satisfaccion: f64,
}

#[derive(Debug, Serialize)]
pub struct TrendPointResponse {
    pub fecha: String,
    pub valor: String,
    pub etiqueta: String,
}

impl From<ServiceSummary> for ServiceSummaryResponse {
    fn from(summary: ServiceSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            price: format_money(summary.price),
        }
    }
}

impl From<ProviderSummary> for ProviderSummaryResponse {
    fn from(summary: ProviderSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
        }
    }
}

impl From<ClientSummary> for ClientSummaryResponse {
    fn from(summary: ClientSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            email: summary.email,
        }
    }
}

impl From<ServiceSold> for ServiceSoldResponse {
    fn from(sold: ServiceSold) -> Self {
        Self {
            service: sold.service.into(),
            cantidad_vendida: sold.quantity_sold,
            ingresos_generados: format_money(sold.revenue),
        }
    }
}

impl From<SalesReport> for SalesReportResponse {
    fn from(report: SalesReport) -> Self {
        Self {
            periodo: report.period,
            total_ventas: format_money(report.total_sales),
            cantidad_reservas: report.booking_count,
            promedio_por_reserva: format_money(report.average_per_booking),
            servicios_mas_vendidos: report.top_services.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<ScoreShare> for ScoreShareResponse {
    fn from(share: ScoreShare) -> Self {
        Self {
            puntuacion: share.score,
            cantidad: share.count,
            porcentaje: share.percentage,
        }
    }
}

impl From<SatisfactionReport> for SatisfactionReportResponse {
    fn from(report: SatisfactionReport) -> Self {
        Self {
            service: report.service.into(),
            total_calificaciones: report.total_ratings,
            promedio_calificacion: report.average_rating,
            distribucion_calificaciones: report.distribution.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<ProviderReport> for ProviderReportResponse {
    fn from(report: ProviderReport) -> Self {
        Self {
            provider: report.provider.into(),
            total_servicios: report.total_services,
            servicios_activos: report.active_services,
            ingresos_totales: format_money(report.total_revenue),
            promedio_calificacion: report.average_rating,
        }
    }
}

impl From<ClientReport> for ClientReportResponse {
    fn from(report: ClientReport) -> Self {
        Self {
            client: report.client.into(),
            total_reservas: report.total_bookings,
            gasto_total: format_money(report.total_spend),
            promedio_gasto: format_money(report.average_spend),
            ultima_reserva: report.last_booking.map(format_date),
        }
    }
}

impl From<GeneralMetrics> for GeneralMetricsResponse {
    fn from(metrics: GeneralMetrics) -> Self {
        Self {
            total_usuarios: metrics.total_users,
            total_clientes: metrics.total_clients,
            total_proveedores: metrics.total_providers,
            total_servicios: metrics.total_services,
            total_reservas: metrics.total_bookings,
            ingresos_totales: format_money(metrics.total_revenue),
            promedio_satisfaccion: metrics.average_satisfaction,
        }
    }
}

impl From<TrendPoint> for TrendPointResponse {
    fn from(point: TrendPoint) -> Self {
        Self {
            fecha: format_date(point.date),
            valor: point.value.to_string(),
            etiqueta: point.label,
        }
    }
}

fn json_list<T, R>(items: Vec<T>) -> HttpResponse
where
    R: Serialize + From<T>,
{
    let body: Vec<R> = items.into_iter().map(R::from).collect();
    HttpResponse::Ok().json(body)
}

/// GET /reports/sales
pub async fn get_sales_report(
    service: web::Data<Arc<ReportService>>,
    credentials: Credentials,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse> {
    let filter = ReportFilter::try_from(query.into_inner())?;
    let report = service.sales_report(&credentials, &filter).await?;
    Ok(HttpResponse::Ok().json(SalesReportResponse::from(report)))
}

/// GET /reports/satisfaction
pub async fn get_satisfaction_report(
    service: web::Data<Arc<ReportService>>,
    credentials: Credentials,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse> {
    let filter = ReportFilter::try_from(query.into_inner())?;
    let reports = service.satisfaction_report(&credentials, &filter).await?;
    Ok(json_list::<_, SatisfactionReportResponse>(reports))
}

/// GET /reports/providers
pub async fn get_provider_report(
    service: web::Data<Arc<ReportService>>,
    credentials: Credentials,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse> {
    let filter = ReportFilter::try_from(query.into_inner())?;
    let reports = service.provider_report(&credentials, &filter).await?;
    Ok(json_list::<_, ProviderReportResponse>(reports))
}

/// GET /reports/clients
pub async fn get_client_report(
    service: web::Data<Arc<ReportService>>,
    credentials: Credentials,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse> {
    let filter = ReportFilter::try_from(query.into_inner())?;
    let reports = service.client_report(&credentials, &filter).await?;
    Ok(json_list::<_, ClientReportResponse>(reports))
}

/// GET /reports/metrics
pub async fn get_general_metrics(
    service: web::Data<Arc<ReportService>>,
    credentials: Credentials,
    query: web::Query<MetricsQuery>,
) -> Result<HttpResponse> {
    let filter = MetricsFilter::try_from(query.into_inner())?;
    let metrics = service.general_metrics(&credentials, &filter).await?;
    Ok(HttpResponse::Ok().json(GeneralMetricsResponse::from(metrics)))
}

/// GET /reports/rankings/services
pub async fn get_most_popular_services(
    service: web::Data<Arc<ReportService>>,
    credentials: Credentials,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse> {
    let ranked = service
        .most_popular_services(&credentials, query.resolve()?)
        .await?;
    Ok(json_list::<_, ServiceSoldResponse>(ranked))
}

/// GET /reports/rankings/providers
pub async fn get_top_rated_providers(
    service: web::Data<Arc<ReportService>>,
    credentials: Credentials,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse> {
    let ranked = service
        .top_rated_providers(&credentials, query.resolve()?)
        .await?;
    Ok(json_list::<_, ProviderReportResponse>(ranked))
}

/// GET /reports/rankings/clients
pub async fn get_most_active_clients(
    service: web::Data<Arc<ReportService>>,
    credentials: Credentials,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse> {
    let ranked = service
        .most_active_clients(&credentials, query.resolve()?)
        .await?;
    Ok(json_list::<_, ClientReportResponse>(ranked))
}

/// GET /reports/trends/sales
pub async fn get_sales_trend(
    service: web::Data<Arc<ReportService>>,
    credentials: Credentials,
    query: web::Query<MetricsQuery>,
) -> Result<HttpResponse> {
    let filter = MetricsFilter::try_from(query.into_inner())?;
    let points = service.sales_trend(&credentials, &filter).await?;
    Ok(json_list::<_, TrendPointResponse>(points))
}

/// GET /reports/trends/satisfaction
pub async fn get_satisfaction_trend(
    service: web::Data<Arc<ReportService>>,
    credentials: Credentials,
    query: web::Query<MetricsQuery>,
) -> Result<HttpResponse> {
    let filter = MetricsFilter::try_from(query.into_inner())?;
    let points = service.satisfaction_trend(&credentials, &filter).await?;
    Ok(json_list::<_, TrendPointResponse>(points))
}

/// Configure report routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/reports")
            .route("/sales", web::get().to(get_sales_report))
            .route("/satisfaction", web::get().to(get_satisfaction_report))
            .route("/providers", web::get().to(get_provider_report))
            .route("/clients", web::get().to(get_client_report))
            .route("/metrics", web::get().to(get_general_metrics))
            .route("/rankings/services", web::get().to(get_most_popular_services))
            .route("/rankings/providers", web::get().to(get_top_rated_providers))
            .route("/rankings/clients", web::get().to(get_most_active_clients))
            .route("/trends/sales", web::get().to(get_sales_trend))
            .route("/trends/satisfaction", web::get().to(get_satisfaction_trend)),
    );
}
