//! Contrato observable de los eventos de cambio.
//!
//! Se emiten estrictamente después de que la mutación es durable, sin outbox:
//! una caída entre commit y publicación pierde el evento. El store es la
//! autoridad; el evento es una señal best-effort.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use flowmeta_domain::EntityKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChangeKind {
    /// Snapshot completo tras la creación.
    Created { snapshot: Value },
    /// Snapshot completo tras el reemplazo.
    Updated { snapshot: Value },
    Deleted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Created { .. } => "Created",
            ChangeKind::Updated { .. } => "Updated",
            ChangeKind::Deleted => "Deleted",
        }
    }

    pub fn snapshot(&self) -> Option<&Value> {
        match self {
            ChangeKind::Created { snapshot } | ChangeKind::Updated { snapshot } => Some(snapshot),
            ChangeKind::Deleted => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: EntityKind,
    pub entity_id: Uuid,
    pub change: ChangeKind,
    pub actor: String,
    pub ts: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(kind: EntityKind, entity_id: Uuid, change: ChangeKind, actor: &str, ts: DateTime<Utc>) -> Self {
        Self { kind,
               entity_id,
               change,
               actor: actor.to_string(),
               ts }
    }

    /// Nombre del evento por tipo: `StepCreated`, `FlowDeleted`, ...
    pub fn name(&self) -> String {
        format!("{}{}", self.kind, self.change.as_str())
    }
}
