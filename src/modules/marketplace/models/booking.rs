use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::client::Client;
use super::reference::{first, first_text, require_id, EntityId, Identified, Reference};
use super::service::Service;
use crate::core::scalars::lenient;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "BookingWire")]
pub struct Booking {
    pub id: EntityId,
    pub client: Option<Reference<Client>>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub status: Option<String>,
    pub total_estimated: Decimal,
    pub line_items: Vec<BookingLineItem>,
}

impl Booking {
    pub fn client_id(&self) -> Option<&EntityId> {
        self.client.as_ref().map(Reference::id)
    }

    pub fn has_status(&self, status: &str) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case(status.trim()))
    }
}

impl Identified for Booking {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

/// One service line of a booking (`reservaServicio` upstream)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "LineItemWire")]
pub struct BookingLineItem {
    /// Nested line items may arrive without an id
    pub id: Option<EntityId>,
    pub booking: Option<Reference<Booking>>,
    pub service: Option<Reference<Service>>,
    /// `None` when the upstream omitted it
    pub quantity: Option<i64>,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl BookingLineItem {
    pub fn service_id(&self) -> Option<&EntityId> {
        self.service.as_ref().map(Reference::id)
    }

    pub fn booking_id(&self) -> Option<&EntityId> {
        self.booking.as_ref().map(Reference::id)
    }
}

#[derive(Deserialize)]
struct BookingWire {
    #[serde(default)]
    id: Option<EntityId>,
    #[serde(default)]
    cliente: Option<Reference<Client>>,
    #[serde(default)]
    cliente_id: Option<Reference<Client>>,
    #[serde(default, rename = "clienteId")]
    cliente_id_camel: Option<Reference<Client>>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    fecha: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    fecha_reserva: Option<NaiveDate>,
    #[serde(default, rename = "fechaReserva", deserialize_with = "lenient::opt_date")]
    fecha_reserva_camel: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::opt_time")]
    hora: Option<NaiveTime>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    estado: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    total_estimado: Option<Decimal>,
    #[serde(default, rename = "totalEstimado", deserialize_with = "lenient::opt_decimal")]
    total_estimado_camel: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    total: Option<Decimal>,
    #[serde(default, deserialize_with = "super::reference::embedded")]
    detalles: Option<Vec<BookingLineItem>>,
    #[serde(default, deserialize_with = "super::reference::embedded")]
    servicios: Option<Vec<BookingLineItem>>,
    #[serde(default, deserialize_with = "super::reference::embedded")]
    reserva_servicios: Option<Vec<BookingLineItem>>,
    #[serde(default, rename = "reservaServicios", deserialize_with = "super::reference::embedded")]
    reserva_servicios_camel: Option<Vec<BookingLineItem>>,
}

impl TryFrom<BookingWire> for Booking {
    type Error = String;

    fn try_from(wire: BookingWire) -> Result<Self, Self::Error> {
        let id = require_id(wire.id, "reserva")?;
        // Nested items under an empty key must not hide items under the next one
        let line_items = [
            wire.detalles,
            wire.servicios,
            wire.reserva_servicios,
            wire.reserva_servicios_camel,
        ]
        .into_iter()
        .flatten()
        .find(|items| !items.is_empty())
        .unwrap_or_default();

        Ok(Self {
            id,
            client: first([wire.cliente, wire.cliente_id, wire.cliente_id_camel]),
            date: first([wire.fecha, wire.fecha_reserva, wire.fecha_reserva_camel]),
            time: wire.hora,
            status: first_text([wire.estado]),
            total_estimated: first([wire.total_estimado, wire.total_estimado_camel, wire.total])
                .unwrap_or_default(),
            line_items,
        })
    }
}

#[derive(Deserialize)]
struct LineItemWire {
    #[serde(default)]
    id: Option<EntityId>,
    #[serde(default)]
    reserva: Option<Reference<Booking>>,
    #[serde(default)]
    reserva_id: Option<Reference<Booking>>,
    #[serde(default, rename = "reservaId")]
    reserva_id_camel: Option<Reference<Booking>>,
    #[serde(default)]
    servicio: Option<Reference<Service>>,
    #[serde(default)]
    servicio_id: Option<Reference<Service>>,
    #[serde(default, rename = "servicioId")]
    servicio_id_camel: Option<Reference<Service>>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    cantidad: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    precio_unitario: Option<Decimal>,
    #[serde(default, rename = "precioUnitario", deserialize_with = "lenient::opt_decimal")]
    precio_unitario_camel: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    subtotal: Option<Decimal>,
}

impl From<LineItemWire> for BookingLineItem {
    fn from(wire: LineItemWire) -> Self {
        Self {
            id: wire.id,
            booking: first([wire.reserva, wire.reserva_id, wire.reserva_id_camel]),
            service: first([wire.servicio, wire.servicio_id, wire.servicio_id_camel]),
            quantity: wire.cantidad,
            unit_price: first([wire.precio_unitario, wire.precio_unitario_camel])
                .unwrap_or_default(),
            subtotal: wire.subtotal.unwrap_or_default(),
        }
    }
}
