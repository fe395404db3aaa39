use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::EntityKind;

/// Referencia etiquetada `{kind, id}` para listas polimórficas
/// (`Assignment.entity_ids`). El kind explícito permite validar existencia y
/// contar referencias inversas contra una sola colección.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: Uuid,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}
