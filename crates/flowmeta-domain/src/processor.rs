use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CompositeKey, EntityHeader};

/// Unidad ejecutable con esquema de entrada y de salida.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Processor {
    #[serde(flatten)]
    pub header: EntityHeader,
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub input_schema_id: Uuid,
    #[serde(default)]
    pub output_schema_id: Uuid,
}

impl Processor {
    pub fn new(version: impl Into<String>, name: impl Into<String>, input_schema_id: Uuid, output_schema_id: Uuid) -> Self {
        Self { header: EntityHeader::default(),
               version: version.into(),
               name: name.into(),
               image: String::new(),
               input_schema_id,
               output_schema_id }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }
}

entity_impl!(Processor, |e| CompositeKey::versioned(&e.version, &e.name));
