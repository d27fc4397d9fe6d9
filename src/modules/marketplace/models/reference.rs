use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Upstream identifier. The REST API emits ids as numbers or strings;
/// both normalize to the same textual key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// `7` and `7.0` name the same entity
fn number_id(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&f) => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => Ok(EntityId(number_id(&n))),
            Value::String(s) if !s.trim().is_empty() => Ok(EntityId(s.trim().to_string())),
            other => Err(D::Error::custom(format!("invalid entity id: {}", other))),
        }
    }
}

/// Entities addressable by id
pub trait Identified {
    fn id(&self) -> &EntityId;
}

/// A field pointing at another entity: either the nested object as the
/// upstream sent it, or only its id. Only the reconciler turns an
/// `Unresolved` reference into a `Resolved` one.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference<T> {
    Resolved(Box<T>),
    Unresolved(EntityId),
}

impl<T: Identified> Reference<T> {
    pub fn resolved(entity: T) -> Self {
        Reference::Resolved(Box::new(entity))
    }

    pub fn id(&self) -> &EntityId {
        match self {
            Reference::Resolved(entity) => entity.id(),
            Reference::Unresolved(id) => id,
        }
    }

    pub fn entity(&self) -> Option<&T> {
        match self {
            Reference::Resolved(entity) => Some(entity.as_ref()),
            Reference::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Reference::Resolved(_))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReference<T> {
    Id(EntityId),
    Entity(Box<T>),
}

impl<'de, T> Deserialize<'de> for Reference<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawReference::<T>::deserialize(deserializer)? {
            RawReference::Id(id) => Ok(Reference::Unresolved(id)),
            RawReference::Entity(entity) => Ok(Reference::Resolved(entity)),
        }
    }
}

/// Nested collections: keeps the elements that decode, drops the rest.
/// Absent or `null` collections stay `None` so key variants can be merged.
pub(crate) fn embedded<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(values) = Option::<Vec<Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let items = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping undecodable nested element");
                None
            }
        })
        .collect();

    Ok(Some(items))
}

/// First present value among key variants of one logical field
pub(crate) fn first<T>(candidates: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    candidates.into_iter().flatten().next()
}

/// First present, non-blank text among key variants
pub(crate) fn first_text(candidates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
}

pub(crate) fn require_id(id: Option<EntityId>, kind: &str) -> Result<EntityId, String> {
    id.ok_or_else(|| format!("{} without an id", kind))
}
