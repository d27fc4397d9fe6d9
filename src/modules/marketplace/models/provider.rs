use serde::Deserialize;

use super::catalog::Location;
use super::client::UserInfo;
use super::reference::{first, first_text, require_id, EntityId, Identified, Reference};
use super::service::Service;
use crate::core::scalars::lenient;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ProviderWire")]
pub struct Provider {
    pub id: EntityId,
    pub name: Option<String>,
    pub user: Option<UserInfo>,
    pub user_id: Option<EntityId>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub location: Option<Reference<Location>>,
    /// May hold id-only entries; completed by the reconciler on demand
    pub services: Vec<Reference<Service>>,
}

impl Provider {
    pub fn stub(id: EntityId) -> Self {
        Self {
            id,
            name: None,
            user: None,
            user_id: None,
            phone: None,
            description: None,
            location: None,
            services: Vec::new(),
        }
    }

    pub fn display_name(&self) -> String {
        first_text([
            self.name.clone(),
            self.user.as_ref().and_then(UserInfo::display_name),
        ])
        .unwrap_or_else(|| self.id.to_string())
    }

    pub fn has_display_fields(&self) -> bool {
        self.name.is_some() || self.user.is_some()
    }

    pub fn city(&self) -> Option<&str> {
        self.location
            .as_ref()
            .and_then(Reference::entity)
            .and_then(|l| l.ciudad.as_deref())
    }
}

impl Identified for Provider {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Deserialize)]
struct ProviderWire {
    #[serde(default)]
    id: Option<EntityId>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    nombre: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    nombre_empresa: Option<String>,
    #[serde(default, rename = "nombreEmpresa", deserialize_with = "lenient::opt_text")]
    nombre_empresa_camel: Option<String>,
    #[serde(default)]
    user: Option<UserInfo>,
    #[serde(default)]
    usuario: Option<UserInfo>,
    #[serde(default)]
    user_id: Option<EntityId>,
    #[serde(default, rename = "userId")]
    user_id_camel: Option<EntityId>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    telefono: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    descripcion: Option<String>,
    #[serde(default)]
    ubicacion: Option<Reference<Location>>,
    #[serde(default)]
    ubicacion_id: Option<Reference<Location>>,
    #[serde(default, deserialize_with = "super::reference::embedded")]
    servicios: Option<Vec<Reference<Service>>>,
}

impl TryFrom<ProviderWire> for Provider {
    type Error = String;

    fn try_from(wire: ProviderWire) -> Result<Self, Self::Error> {
        let user = first([wire.user, wire.usuario]);
        let user_id = first([
            wire.user_id,
            wire.user_id_camel,
            user.as_ref().and_then(|u| u.id.clone()),
        ]);

        Ok(Self {
            id: require_id(wire.id, "proveedor")?,
            name: first_text([wire.nombre, wire.nombre_empresa, wire.nombre_empresa_camel]),
            user,
            user_id,
            phone: wire.telefono,
            description: wire.descripcion,
            location: first([wire.ubicacion, wire.ubicacion_id]),
            services: wire.servicios.unwrap_or_default(),
        })
    }
}
