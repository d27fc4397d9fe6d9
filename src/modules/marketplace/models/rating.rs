use chrono::NaiveDate;
use serde::Deserialize;

use super::client::Client;
use super::reference::{first, first_text, require_id, EntityId, Identified, Reference};
use super::service::Service;
use crate::core::scalars::lenient;

/// A client's score for a service, typically 1..=5
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RatingWire")]
pub struct Rating {
    pub id: EntityId,
    pub client: Option<Reference<Client>>,
    pub service: Option<Reference<Service>>,
    pub score: i64,
    pub comment: Option<String>,
    pub date: Option<NaiveDate>,
}

impl Rating {
    pub fn service_id(&self) -> Option<&EntityId> {
        self.service.as_ref().map(Reference::id)
    }
}

impl Identified for Rating {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "CommentWire")]
pub struct Comment {
    pub id: EntityId,
    pub client: Option<Reference<Client>>,
    pub service: Option<Reference<Service>>,
    pub text: String,
    pub date: Option<NaiveDate>,
}

impl Identified for Comment {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Deserialize)]
struct RatingWire {
    #[serde(default)]
    id: Option<EntityId>,
    #[serde(default)]
    cliente: Option<Reference<Client>>,
    #[serde(default)]
    cliente_id: Option<Reference<Client>>,
    #[serde(default, rename = "clienteId")]
    cliente_id_camel: Option<Reference<Client>>,
    #[serde(default)]
    servicio: Option<Reference<Service>>,
    #[serde(default)]
    servicio_id: Option<Reference<Service>>,
    #[serde(default, rename = "servicioId")]
    servicio_id_camel: Option<Reference<Service>>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    puntuacion: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    puntaje: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    comentario: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    fecha: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    fecha_calificacion: Option<NaiveDate>,
    #[serde(default, rename = "fechaCalificacion", deserialize_with = "lenient::opt_date")]
    fecha_calificacion_camel: Option<NaiveDate>,
}

impl TryFrom<RatingWire> for Rating {
    type Error = String;

    fn try_from(wire: RatingWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: require_id(wire.id, "calificacion")?,
            client: first([wire.cliente, wire.cliente_id, wire.cliente_id_camel]),
            service: first([wire.servicio, wire.servicio_id, wire.servicio_id_camel]),
            score: first([wire.puntuacion, wire.puntaje]).unwrap_or_default(),
            comment: first_text([wire.comentario]),
            date: first([
                wire.fecha,
                wire.fecha_calificacion,
                wire.fecha_calificacion_camel,
            ]),
        })
    }
}

#[derive(Deserialize)]
struct CommentWire {
    #[serde(default)]
    id: Option<EntityId>,
    #[serde(default)]
    cliente: Option<Reference<Client>>,
    #[serde(default)]
    cliente_id: Option<Reference<Client>>,
    #[serde(default)]
    servicio: Option<Reference<Service>>,
    #[serde(default)]
    servicio_id: Option<Reference<Service>>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    texto: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    contenido: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    comentario: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    fecha: Option<NaiveDate>,
}

impl TryFrom<CommentWire> for Comment {
    type Error = String;

    fn try_from(wire: CommentWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: require_id(wire.id, "comentario")?,
            client: first([wire.cliente, wire.cliente_id]),
            service: first([wire.servicio, wire.servicio_id]),
            text: first_text([wire.texto, wire.contenido, wire.comentario]).unwrap_or_default(),
            date: wire.fecha,
        })
    }
}
