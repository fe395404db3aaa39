//! Backends y publicadores de prueba que envuelven a los reales para inyectar fallos.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use flowmeta_core::domain::{EntityKind, Processor, Schema};
use flowmeta_core::{ChangeEvent, DocumentStore, EventPublisher, InMemoryDocumentStore, InMemoryEventPublisher,
                    MetadataStore, NewDocument, Page, PublishError, ReferenceCatalog, RequestContext, StoreError,
                    StoredDocument};

pub type MemStore = MetadataStore<InMemoryDocumentStore, InMemoryEventPublisher>;

pub fn ctx() -> RequestContext {
    RequestContext::new("tester")
}

/// Store en memoria con acceso compartido al publicador para inspeccionar eventos.
pub fn memory_store() -> (MemStore, Arc<InMemoryEventPublisher>) {
    let publisher = Arc::new(InMemoryEventPublisher::new());
    let store = MetadataStore::from_shared(Arc::new(InMemoryDocumentStore::new()),
                                           Arc::clone(&publisher),
                                           ReferenceCatalog::standard());
    (store, publisher)
}

pub async fn schema(store: &MemStore, version: &str, name: &str) -> Schema {
    store.entities::<Schema>().create(&ctx(), Schema::new(version, name)).await.unwrap()
}

pub async fn processor(store: &MemStore, name: &str, input: Uuid, output: Uuid) -> Processor {
    store.entities::<Processor>()
         .create(&ctx(), Processor::new("v1", name, input, output))
         .await
         .unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Sin fallos: delega todo.
    None,
    /// Toda operación falla con `Unavailable` mientras el interruptor esté activo.
    Unavailable,
    /// `get_by_key` nunca encuentra nada: la precondición de unicidad siempre
    /// pasa y sólo el índice del backend decide.
    BlindKeyLookup,
    /// `insert` espera antes de escribir.
    SlowInsert(Duration),
}

pub struct FaultyStore {
    pub inner: InMemoryDocumentStore,
    pub fault: Fault,
    pub tripped: AtomicBool,
}

impl FaultyStore {
    pub fn new(fault: Fault) -> Self {
        Self { inner: InMemoryDocumentStore::new(),
               fault,
               tripped: AtomicBool::new(false) }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fault == Fault::Unavailable && self.tripped.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn get_by_id(&self, kind: EntityKind, id: Uuid) -> Result<Option<StoredDocument>, StoreError> {
        self.check()?;
        self.inner.get_by_id(kind, id).await
    }

    async fn get_by_key(&self, kind: EntityKind, composite_key: &str) -> Result<Option<StoredDocument>, StoreError> {
        self.check()?;
        if self.fault == Fault::BlindKeyLookup {
            return Ok(None);
        }
        self.inner.get_by_key(kind, composite_key).await
    }

    async fn list(&self, kind: EntityKind, page: Option<Page>) -> Result<Vec<StoredDocument>, StoreError> {
        self.check()?;
        self.inner.list(kind, page).await
    }

    async fn insert(&self, doc: NewDocument) -> Result<StoredDocument, StoreError> {
        self.check()?;
        if let Fault::SlowInsert(delay) = self.fault {
            tokio::time::sleep(delay).await;
        }
        self.inner.insert(doc).await
    }

    async fn replace(&self, doc: NewDocument) -> Result<Option<StoredDocument>, StoreError> {
        self.check()?;
        self.inner.replace(doc).await
    }

    async fn delete(&self, kind: EntityKind, id: Uuid) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.delete(kind, id).await
    }

    async fn count(&self, kind: EntityKind) -> Result<u64, StoreError> {
        self.check()?;
        self.inner.count(kind).await
    }

    async fn count_matching(&self, kind: EntityKind, probe: &Value) -> Result<u64, StoreError> {
        self.check()?;
        self.inner.count_matching(kind, probe).await
    }
}

/// Publicador que siempre falla.
pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, event: &ChangeEvent) -> Result<(), PublishError> {
        Err(PublishError::Failed(format!("broker down ({})", event.name())))
    }
}
