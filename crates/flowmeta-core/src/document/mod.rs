//! Contrato del backend de documentos y backend en memoria.
//!
//! Un `DocumentStore` expone una colección por tipo de entidad, indexada por
//! id, con un índice único sobre la clave compuesta (forma de
//! almacenamiento). Es la autoridad final de unicidad: el chequeo previo del
//! `EntityStore` es solo una precondición.

mod json;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use flowmeta_domain::EntityKind;

use crate::errors::StoreError;

pub use json::json_contains;
pub use memory::InMemoryDocumentStore;

/// Documento persistido. `seq` es monotónico por backend y define el orden de
/// inserción (se conserva en los reemplazos).
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub kind: EntityKind,
    pub id: Uuid,
    pub composite_key: String,
    pub seq: u64,
    pub body: Value,
}

/// Documento a insertar o reemplazar (reemplazo completo, sin parches).
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub kind: EntityKind,
    pub id: Uuid,
    pub composite_key: String,
    pub body: Value,
}

/// Página base cero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub index: u32,
    pub size: u32,
}

impl Page {
    pub fn new(index: u32, size: u32) -> Self {
        Self { index, size }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.index) * u64::from(self.size)
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    async fn get_by_id(&self, kind: EntityKind, id: Uuid) -> Result<Option<StoredDocument>, StoreError>;

    async fn get_by_key(&self, kind: EntityKind, composite_key: &str) -> Result<Option<StoredDocument>, StoreError>;

    /// Documentos del tipo en orden de inserción; `None` devuelve todos.
    async fn list(&self, kind: EntityKind, page: Option<Page>) -> Result<Vec<StoredDocument>, StoreError>;

    /// Inserta; `StoreError::UniqueViolation` si la clave (o el id) ya existe.
    async fn insert(&self, doc: NewDocument) -> Result<StoredDocument, StoreError>;

    /// Reemplaza el documento con el mismo id. `Ok(None)` si no existe.
    async fn replace(&self, doc: NewDocument) -> Result<Option<StoredDocument>, StoreError>;

    /// Borrado físico; devuelve si existía.
    async fn delete(&self, kind: EntityKind, id: Uuid) -> Result<bool, StoreError>;

    async fn count(&self, kind: EntityKind) -> Result<u64, StoreError>;

    /// Cuenta documentos del tipo cuyo cuerpo contiene `probe` (semántica
    /// de contención JSON, equivalente a `@>` de Postgres).
    async fn count_matching(&self, kind: EntityKind, probe: &Value) -> Result<u64, StoreError>;

    async fn exists_by_id(&self, kind: EntityKind, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.get_by_id(kind, id).await?.is_some())
    }

    async fn exists_by_key(&self, kind: EntityKind, composite_key: &str) -> Result<bool, StoreError> {
        Ok(self.get_by_key(kind, composite_key).await?.is_some())
    }
}
