use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CompositeKey, EntityHeader};

/// Contenido entregado a un step, descrito por un `Schema`. El payload no se
/// valida contra el esquema en esta capa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    #[serde(flatten)]
    pub header: EntityHeader,
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub schema_id: Uuid,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Delivery {
    pub fn new(version: impl Into<String>, name: impl Into<String>, schema_id: Uuid) -> Self {
        Self { header: EntityHeader::default(),
               version: version.into(),
               name: name.into(),
               schema_id,
               payload: serde_json::Value::Null }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

entity_impl!(Delivery, |e| CompositeKey::versioned(&e.version, &e.name));
