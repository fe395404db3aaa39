use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CompositeKey, EntityHeader};

/// Dirección (endpoint) tipada por un `Schema`. La propia dirección forma
/// parte de la clave, de modo que una misma versión+nombre puede declarar
/// varios endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(flatten)]
    pub header: EntityHeader,
    pub version: String,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub schema_id: Uuid,
}

impl Address {
    pub fn new(version: impl Into<String>, name: impl Into<String>, address: impl Into<String>, schema_id: Uuid) -> Self {
        Self { header: EntityHeader::default(),
               version: version.into(),
               name: name.into(),
               address: address.into(),
               schema_id }
    }
}

entity_impl!(Address, |e| CompositeKey::new([e.version.as_str(), e.name.as_str(), e.address.as_str()]));
