use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Campos comunes a toda entidad: identificador generado, descripción libre y
/// auditoría (timestamps y actor). El store es quien asigna `id` y los campos
/// de auditoría; lo que envíe el cliente en ellos se ignora al crear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityHeader {
    pub id: Uuid,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl EntityHeader {
    pub fn with_description(description: impl Into<String>) -> Self {
        Self { description: description.into(),
               ..Self::default() }
    }
}
