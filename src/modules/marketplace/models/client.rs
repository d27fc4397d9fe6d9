use serde::Deserialize;

use super::booking::Booking;
use super::reference::{first, first_text, require_id, EntityId, Identified, Reference};
use crate::core::scalars::lenient;

/// Account data the upstream nests under `user` / `usuario`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub id: Option<EntityId>,
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(alias = "lastName")]
    pub last_name: Option<String>,
}

impl UserInfo {
    /// "first last", falling back to username then email
    pub fn display_name(&self) -> Option<String> {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if !full.is_empty() {
            return Some(full);
        }
        first_text([self.username.clone(), self.email.clone()])
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ClientWire")]
pub struct Client {
    pub id: EntityId,
    pub name: Option<String>,
    pub user: Option<UserInfo>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub bookings: Vec<Reference<Booking>>,
}

impl Client {
    pub fn stub(id: EntityId) -> Self {
        Self {
            id,
            name: None,
            user: None,
            phone: None,
            address: None,
            email: None,
            bookings: Vec::new(),
        }
    }

    /// Best display value available; the raw id when nothing else is.
    pub fn display_name(&self) -> String {
        first_text([
            self.name.clone(),
            self.user.as_ref().and_then(UserInfo::display_name),
            self.email.clone(),
        ])
        .unwrap_or_else(|| self.id.to_string())
    }

    pub fn has_display_fields(&self) -> bool {
        self.name.is_some() || self.user.is_some() || self.email.is_some()
    }
}

impl Identified for Client {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Deserialize)]
struct ClientWire {
    #[serde(default)]
    id: Option<EntityId>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    nombre: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    nombre_completo: Option<String>,
    #[serde(default, rename = "nombreCompleto", deserialize_with = "lenient::opt_text")]
    nombre_completo_camel: Option<String>,
    #[serde(default)]
    user: Option<UserInfo>,
    #[serde(default)]
    usuario: Option<UserInfo>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    telefono: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    direccion: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    email: Option<String>,
    #[serde(default, deserialize_with = "super::reference::embedded")]
    reservas: Option<Vec<Reference<Booking>>>,
}

impl TryFrom<ClientWire> for Client {
    type Error = String;

    fn try_from(wire: ClientWire) -> Result<Self, Self::Error> {
        let user = first([wire.user, wire.usuario]);
        let email = first_text([
            wire.email,
            user.as_ref().and_then(|u| u.email.clone()),
        ]);

        Ok(Self {
            id: require_id(wire.id, "cliente")?,
            name: first_text([wire.nombre, wire.nombre_completo, wire.nombre_completo_camel]),
            user,
            phone: wire.telefono,
            address: wire.direccion,
            email,
            bookings: wire.reservas.unwrap_or_default(),
        })
    }
}
