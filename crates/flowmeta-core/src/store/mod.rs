//! Store tipado por entidad.
//!
//! `MetadataStore` agrupa los recursos compartidos (backend, validador,
//! publicador) y entrega un `EntityStore<T>` por tipo. Cada mutación sigue el
//! mismo orden: lecturas de validación, una única escritura atómica y, ya
//! fuera del plazo de la petición, la publicación del evento.

mod entity_store;

pub use entity_store::EntityStore;

use std::sync::Arc;

use flowmeta_domain::Entity;

use crate::catalog::ReferenceCatalog;
use crate::document::DocumentStore;
use crate::event::EventPublisher;
use crate::integrity::IntegrityValidator;

pub struct MetadataStore<D: DocumentStore, P: EventPublisher> {
    documents: Arc<D>,
    validator: Arc<IntegrityValidator<D>>,
    publisher: Arc<P>,
}

impl<D: DocumentStore, P: EventPublisher> MetadataStore<D, P> {
    pub fn new(documents: D, publisher: P) -> Self {
        Self::with_catalog(documents, publisher, ReferenceCatalog::standard())
    }

    pub fn with_catalog(documents: D, publisher: P, catalog: ReferenceCatalog) -> Self {
        Self::from_shared(Arc::new(documents), Arc::new(publisher), catalog)
    }

    /// Construye sobre backend y publicador ya compartidos (p.ej. para
    /// inspeccionar los eventos desde un test).
    pub fn from_shared(documents: Arc<D>, publisher: Arc<P>, catalog: ReferenceCatalog) -> Self {
        let validator = Arc::new(IntegrityValidator::new(Arc::clone(&documents), Arc::new(catalog)));
        Self { documents,
               validator,
               publisher }
    }

    pub fn entities<T: Entity>(&self) -> EntityStore<T, D, P> {
        EntityStore::new(Arc::clone(&self.documents), Arc::clone(&self.validator), Arc::clone(&self.publisher))
    }

    pub fn validator(&self) -> &IntegrityValidator<D> {
        &self.validator
    }

    pub fn documents(&self) -> &D {
        &self.documents
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }
}

impl<D: DocumentStore, P: EventPublisher> Clone for MetadataStore<D, P> {
    fn clone(&self) -> Self {
        Self { documents: Arc::clone(&self.documents),
               validator: Arc::clone(&self.validator),
               publisher: Arc::clone(&self.publisher) }
    }
}
