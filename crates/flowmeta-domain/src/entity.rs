//! Contrato común de las entidades del grafo.

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::{AnyEntity, CompositeKey, EntityHeader, EntityKind};

/// Entidad persistible en el store de metadatos.
///
/// La forma serializada (JSON) es la que ve el backend: los nombres de campo
/// de las FKs deben coincidir con los declarados en el catálogo de
/// referencias de `flowmeta-core`.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn header(&self) -> &EntityHeader;
    fn header_mut(&mut self) -> &mut EntityHeader;
    fn composite_key(&self) -> CompositeKey;
    fn into_any(self) -> AnyEntity;
    fn from_any(any: AnyEntity) -> Option<Self>;

    fn id(&self) -> Uuid {
        self.header().id
    }
}
