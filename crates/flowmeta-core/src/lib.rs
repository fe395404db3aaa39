//! flowmeta-core: store de metadatos con integridad referencial.
//!
//! Capas (de la hoja a la raíz):
//! - `document`: contrato del backend (`DocumentStore`) y backend en memoria.
//! - `catalog`: grafo estático de referencias entre tipos de entidad.
//! - `integrity`: validación hacia adelante (FK existe) y hacia atrás
//!   (referencias inversas) guiada por el catálogo.
//! - `event`: publicación de eventos de cambio tras cada mutación.
//! - `store`: `EntityStore<T>` tipado (unicidad, timestamps, eventos).
//! - `router`: comandos/respuestas serializables sobre el store.
pub mod catalog;
pub mod context;
pub mod document;
pub mod errors;
pub mod event;
pub mod integrity;
pub mod router;
pub mod store;

pub use catalog::{Cardinality, ReferenceCatalog, ReferenceField, ReferenceTarget, Requirement};
pub use context::RequestContext;
pub use document::{DocumentStore, InMemoryDocumentStore, NewDocument, Page, StoredDocument};
pub use errors::{MetaError, StoreError};
pub use event::{BroadcastEventPublisher, ChangeEvent, ChangeKind, EventPublisher, InMemoryEventPublisher, PublishError};
pub use integrity::{BlockedOperation, ForeignKeyViolation, IntegrityValidator, ReferenceCount, ReferenceReport, ViolationReason};
pub use router::{Command, CommandRouter, Failure, Reply};
pub use store::{EntityStore, MetadataStore};

pub use flowmeta_domain as domain;
