use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CompositeKey, EntityHeader, EntityRef};

/// Asigna a un step las entidades (direcciones, entregas o esquemas) que
/// consume. Hay a lo sumo una asignación por step: la clave es `step_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(flatten)]
    pub header: EntityHeader,
    #[serde(default)]
    pub step_id: Uuid,
    #[serde(default)]
    pub entity_ids: Vec<EntityRef>,
}

impl Assignment {
    pub fn new(step_id: Uuid, entity_ids: Vec<EntityRef>) -> Self {
        Self { header: EntityHeader::default(),
               step_id,
               entity_ids }
    }
}

entity_impl!(Assignment, |e| CompositeKey::new([e.step_id.to_string()]));
