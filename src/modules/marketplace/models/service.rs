use rust_decimal::Decimal;
use serde::Deserialize;

use super::booking::BookingLineItem;
use super::catalog::Category;
use super::provider::Provider;
use super::rating::Rating;
use super::reference::{first, first_text, require_id, EntityId, Identified, Reference};
use crate::core::scalars::lenient;

/// A service offered by a provider
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ServiceWire")]
pub struct Service {
    pub id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub provider: Option<Reference<Provider>>,
    pub category: Option<Reference<Category>>,
    pub average_rating: f64,
    pub line_items: Vec<BookingLineItem>,
    pub ratings: Vec<Rating>,
}

impl Service {
    /// Id-only placeholder used when nothing better is known
    pub fn stub(id: EntityId) -> Self {
        Self {
            id,
            name: String::new(),
            description: None,
            price: Decimal::ZERO,
            provider: None,
            category: None,
            average_rating: 0.0,
            line_items: Vec::new(),
            ratings: Vec::new(),
        }
    }

    /// Missing the display fields reports rely on (name or price)
    pub fn is_incomplete(&self) -> bool {
        self.name.trim().is_empty() || self.price.is_zero()
    }

    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }

    pub fn provider_id(&self) -> Option<&EntityId> {
        self.provider.as_ref().map(Reference::id)
    }

    pub fn category_id(&self) -> Option<&EntityId> {
        self.category.as_ref().map(Reference::id)
    }

    /// Fill gaps in `self` from a fuller copy of the same service.
    pub fn backfill_from(&mut self, other: &Service) {
        if self.name.trim().is_empty() {
            self.name = other.name.clone();
        }
        if self.price.is_zero() {
            self.price = other.price;
        }
        if self.description.is_none() {
            self.description = other.description.clone();
        }
        if self.provider.as_ref().map_or(true, |p| !p.is_resolved()) && other.provider.is_some() {
            self.provider = other.provider.clone();
        }
        if self.category.as_ref().map_or(true, |c| !c.is_resolved()) && other.category.is_some() {
            self.category = other.category.clone();
        }
        if self.average_rating == 0.0 {
            self.average_rating = other.average_rating;
        }
    }
}

impl Identified for Service {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Deserialize)]
struct ServiceWire {
    #[serde(default)]
    id: Option<EntityId>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    nombre_servicio: Option<String>,
    #[serde(default, rename = "nombreServicio", deserialize_with = "lenient::opt_text")]
    nombre_servicio_camel: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    nombre: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    descripcion: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    precio: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    precio_base: Option<Decimal>,
    #[serde(default, rename = "precioBase", deserialize_with = "lenient::opt_decimal")]
    precio_base_camel: Option<Decimal>,
    #[serde(default)]
    proveedor: Option<Reference<Provider>>,
    #[serde(default)]
    proveedor_id: Option<Reference<Provider>>,
    #[serde(default, rename = "proveedorId")]
    proveedor_id_camel: Option<Reference<Provider>>,
    #[serde(default)]
    categoria: Option<Reference<Category>>,
    #[serde(default)]
    categoria_id: Option<Reference<Category>>,
    #[serde(default, rename = "categoriaId")]
    categoria_id_camel: Option<Reference<Category>>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    rating_promedio: Option<f64>,
    #[serde(default, rename = "ratingPromedio", deserialize_with = "lenient::opt_f64")]
    rating_promedio_camel: Option<f64>,
    #[serde(default, deserialize_with = "super::reference::embedded")]
    reserva_servicios: Option<Vec<BookingLineItem>>,
    #[serde(default, rename = "reservaServicios", deserialize_with = "super::reference::embedded")]
    reserva_servicios_camel: Option<Vec<BookingLineItem>>,
    #[serde(default, deserialize_with = "super::reference::embedded")]
    calificaciones: Option<Vec<Rating>>,
}

impl TryFrom<ServiceWire> for Service {
    type Error = String;

    fn try_from(wire: ServiceWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: require_id(wire.id, "servicio")?,
            name: first_text([wire.nombre_servicio, wire.nombre_servicio_camel, wire.nombre])
                .unwrap_or_default(),
            description: wire.descripcion,
            price: first([wire.precio, wire.precio_base, wire.precio_base_camel])
                .unwrap_or_default(),
            provider: first([wire.proveedor, wire.proveedor_id, wire.proveedor_id_camel]),
            category: first([wire.categoria, wire.categoria_id, wire.categoria_id_camel]),
            average_rating: first([wire.rating_promedio, wire.rating_promedio_camel])
                .unwrap_or_default(),
            line_items: first([wire.reserva_servicios, wire.reserva_servicios_camel])
                .unwrap_or_default(),
            ratings: wire.calificaciones.unwrap_or_default(),
        })
    }
}
