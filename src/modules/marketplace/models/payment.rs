use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::booking::Booking;
use super::reference::{first, first_text, require_id, EntityId, Identified, Reference};
use crate::core::scalars::lenient;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "PaymentWire")]
pub struct Payment {
    pub id: EntityId,
    pub booking: Option<Reference<Booking>>,
    pub method: Option<String>,
    pub amount: Decimal,
    pub status: Option<String>,
    pub reference: Option<String>,
    pub paid_on: Option<NaiveDate>,
}

impl Identified for Payment {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Deserialize)]
struct PaymentWire {
    #[serde(default)]
    id: Option<EntityId>,
    #[serde(default)]
    reserva: Option<Reference<Booking>>,
    #[serde(default)]
    reserva_id: Option<Reference<Booking>>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    metodo_pago: Option<String>,
    #[serde(default, rename = "metodoPago", deserialize_with = "lenient::opt_text")]
    metodo_pago_camel: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    monto: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    estado: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    referencia: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    fecha_pago: Option<NaiveDate>,
    #[serde(default, rename = "fechaPago", deserialize_with = "lenient::opt_date")]
    fecha_pago_camel: Option<NaiveDate>,
}

impl TryFrom<PaymentWire> for Payment {
    type Error = String;

    fn try_from(wire: PaymentWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: require_id(wire.id, "pago")?,
            booking: first([wire.reserva, wire.reserva_id]),
            method: first_text([wire.metodo_pago, wire.metodo_pago_camel]),
            amount: wire.monto.unwrap_or_default(),
            status: wire.estado,
            reference: wire.referencia,
            paid_on: first([wire.fecha_pago, wire.fecha_pago_camel]),
        })
    }
}
