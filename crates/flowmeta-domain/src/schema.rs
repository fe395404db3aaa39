use serde::{Deserialize, Serialize};

use crate::{CompositeKey, EntityHeader};

/// Definición de esquema (documento JSON Schema) referenciada por
/// direcciones, entregas, procesadores y asignaciones. Nodo hoja del grafo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(flatten)]
    pub header: EntityHeader,
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub definition: serde_json::Value,
}

impl Schema {
    pub fn new(version: impl Into<String>, name: impl Into<String>) -> Self {
        Self { header: EntityHeader::default(),
               version: version.into(),
               name: name.into(),
               definition: serde_json::Value::Null }
    }

    pub fn with_definition(mut self, definition: serde_json::Value) -> Self {
        self.definition = definition;
        self
    }
}

entity_impl!(Schema, |e| CompositeKey::versioned(&e.version, &e.name));
