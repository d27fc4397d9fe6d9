use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::reference::EntityId;
use crate::core::scalars::format_date;

/// Translation of a filter into upstream query parameters.
/// Absent fields produce no parameter at all.
pub trait QueryParams {
    fn query_pairs(&self) -> Vec<(&'static str, String)>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Pagination {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }
}

impl QueryParams for Pagination {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push(&mut pairs, "limit", self.limit);
        push(&mut pairs, "offset", self.offset);
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceFilter {
    pub category_id: Option<EntityId>,
    pub provider_id: Option<EntityId>,
    pub city: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_rating: Option<f64>,
    pub search: Option<String>,
    /// Restrict to the caller's own services (`solo_mios=true`)
    pub only_mine: bool,
}

impl QueryParams for ServiceFilter {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push(&mut pairs, "categoria_id", self.category_id.as_ref());
        push(&mut pairs, "proveedor_id", self.provider_id.as_ref());
        push(&mut pairs, "ciudad", self.city.as_ref());
        push(&mut pairs, "precio_min", self.min_price);
        push(&mut pairs, "precio_max", self.max_price);
        push(&mut pairs, "min_rating", self.min_rating);
        push(&mut pairs, "q", self.search.as_ref());
        if self.only_mine {
            pairs.push(("solo_mios", "true".to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub client_id: Option<EntityId>,
    pub status: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl QueryParams for BookingFilter {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push(&mut pairs, "cliente_id", self.client_id.as_ref());
        push(&mut pairs, "estado", self.status.as_ref());
        push(&mut pairs, "fechaDesde", self.date_from.map(format_date));
        push(&mut pairs, "fechaHasta", self.date_to.map(format_date));
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineItemFilter {
    pub booking_id: Option<EntityId>,
    pub provider_id: Option<EntityId>,
}

impl QueryParams for LineItemFilter {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push(&mut pairs, "reserva_id", self.booking_id.as_ref());
        push(&mut pairs, "proveedor_id", self.provider_id.as_ref());
        pairs
    }
}

/// Ratings and comments are both filtered by service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RatingFilter {
    pub service_id: Option<EntityId>,
}

impl QueryParams for RatingFilter {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push(&mut pairs, "servicio_id", self.service_id.as_ref());
        pairs
    }
}

fn push<T: ToString>(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<T>) {
    if let Some(value) = value {
        pairs.push((key, value.to_string()));
    }
}
