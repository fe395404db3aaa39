use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CompositeKey, EntityHeader};

/// Flow ejecutable: un `Flow` más las asignaciones de sus steps. Nadie lo
/// referencia (nodo sumidero del grafo).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratedFlow {
    #[serde(flatten)]
    pub header: EntityHeader,
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub flow_id: Uuid,
    #[serde(default)]
    pub assignment_ids: Vec<Uuid>,
    #[serde(default)]
    pub active: bool,
}

impl OrchestratedFlow {
    pub fn new(version: impl Into<String>, name: impl Into<String>, flow_id: Uuid, assignment_ids: Vec<Uuid>) -> Self {
        Self { header: EntityHeader::default(),
               version: version.into(),
               name: name.into(),
               flow_id,
               assignment_ids,
               active: false }
    }
}

entity_impl!(OrchestratedFlow, |e| CompositeKey::versioned(&e.version, &e.name));
