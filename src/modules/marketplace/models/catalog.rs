use serde::Deserialize;

use super::reference::{EntityId, Identified};
use crate::core::scalars::lenient;

/// Physical location of a provider
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Location {
    pub id: EntityId,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub ciudad: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub direccion: Option<String>,
    #[serde(default, alias = "region", deserialize_with = "lenient::opt_text")]
    pub provincia: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub pais: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Category {
    pub id: EntityId,
    #[serde(default, alias = "nombre_categoria", alias = "nombreCategoria")]
    pub nombre: Option<String>,
    #[serde(default)]
    pub descripcion: Option<String>,
}

impl Identified for Location {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Identified for Category {
    fn id(&self) -> &EntityId {
        &self.id
    }
}
