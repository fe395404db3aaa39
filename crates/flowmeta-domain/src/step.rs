use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CompositeKey, EntityHeader};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub header: EntityHeader,
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub processor_id: Uuid,
    /// Parámetros base del step (opacos para el store).
    #[serde(default)]
    pub parameters: serde_json::Value,
}

impl Step {
    pub fn new(version: impl Into<String>, name: impl Into<String>, processor_id: Uuid) -> Self {
        Self { header: EntityHeader::default(),
               version: version.into(),
               name: name.into(),
               processor_id,
               parameters: serde_json::Value::Null }
    }
}

entity_impl!(Step, |e| CompositeKey::versioned(&e.version, &e.name));
