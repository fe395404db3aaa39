use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CompositeKey, EntityHeader};

/// Secuencia de steps. La lista puede estar vacía, nunca con ids colgantes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    #[serde(flatten)]
    pub header: EntityHeader,
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub step_ids: Vec<Uuid>,
}

impl Flow {
    pub fn new(version: impl Into<String>, name: impl Into<String>, step_ids: Vec<Uuid>) -> Self {
        Self { header: EntityHeader::default(),
               version: version.into(),
               name: name.into(),
               step_ids }
    }
}

entity_impl!(Flow, |e| CompositeKey::versioned(&e.version, &e.name));
