//! Backend en memoria: una colección `DashMap` por tipo de entidad.
//!
//! El índice único vive en su propio `DashMap` (clave compuesta -> id). La API
//! `entry` bloquea el shard de la clave mientras se decide, de modo que dos
//! inserciones concurrentes con la misma clave no pueden ganar ambas.
//!
//! Todas las escrituras de una colección pasan por su `Mutex`, así un
//! reemplazo lee la clave vigente, reserva la nueva y libera la anterior sin
//! otra escritura intercalada. Las lecturas no toman ese cerrojo; `get_by_key`
//! sólo devuelve la fila si su clave actual coincide con la consultada.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use flowmeta_domain::EntityKind;

use super::{json_contains, DocumentStore, NewDocument, Page, StoredDocument};
use crate::errors::StoreError;

#[derive(Default)]
struct Collection {
    docs: DashMap<Uuid, StoredDocument>,
    keys: DashMap<String, Uuid>,
    writes: Mutex<()>,
}

pub struct InMemoryDocumentStore {
    collections: [Collection; EntityKind::COUNT],
    seq: AtomicU64,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self { collections: std::array::from_fn(|_| Collection::default()),
               seq: AtomicU64::new(0) }
    }

    fn collection(&self, kind: EntityKind) -> &Collection {
        &self.collections[kind as usize]
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_by_id(&self, kind: EntityKind, id: Uuid) -> Result<Option<StoredDocument>, StoreError> {
        Ok(self.collection(kind).docs.get(&id).map(|d| d.value().clone()))
    }

    async fn get_by_key(&self, kind: EntityKind, composite_key: &str) -> Result<Option<StoredDocument>, StoreError> {
        let coll = self.collection(kind);
        let Some(id) = coll.keys.get(composite_key).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(coll.docs
               .get(&id)
               .filter(|d| d.composite_key == composite_key)
               .map(|d| d.value().clone()))
    }

    async fn list(&self, kind: EntityKind, page: Option<Page>) -> Result<Vec<StoredDocument>, StoreError> {
        let mut docs: Vec<StoredDocument> = self.collection(kind).docs.iter().map(|d| d.value().clone()).collect();
        docs.sort_by_key(|d| d.seq);
        Ok(match page {
            Some(p) => docs.into_iter()
                           .skip(usize::try_from(p.offset()).unwrap_or(usize::MAX))
                           .take(p.size as usize)
                           .collect(),
            None => docs,
        })
    }

    async fn insert(&self, doc: NewDocument) -> Result<StoredDocument, StoreError> {
        let coll = self.collection(doc.kind);
        let _writes = coll.writes.lock().await;
        match coll.keys.entry(doc.composite_key.clone()) {
            Entry::Occupied(_) => Err(StoreError::UniqueViolation { kind: doc.kind,
                                                                    detail: format!("composite_key {}", doc.composite_key) }),
            Entry::Vacant(slot) => {
                if coll.docs.contains_key(&doc.id) {
                    return Err(StoreError::UniqueViolation { kind: doc.kind,
                                                             detail: format!("id {}", doc.id) });
                }
                let stored = StoredDocument { kind: doc.kind,
                                              id: doc.id,
                                              composite_key: doc.composite_key,
                                              seq: self.next_seq(),
                                              body: doc.body };
                coll.docs.insert(stored.id, stored.clone());
                // La clave se publica después del documento: quien la vea encuentra la fila.
                slot.insert(stored.id);
                Ok(stored)
            }
        }
    }

    async fn replace(&self, doc: NewDocument) -> Result<Option<StoredDocument>, StoreError> {
        let coll = self.collection(doc.kind);
        let _writes = coll.writes.lock().await;
        let Some(previous_key) = coll.docs.get(&doc.id).map(|d| d.composite_key.clone()) else {
            return Ok(None);
        };
        let key_changed = previous_key != doc.composite_key;
        if key_changed {
            match coll.keys.entry(doc.composite_key.clone()) {
                Entry::Occupied(owner) if *owner.get() != doc.id => {
                    return Err(StoreError::UniqueViolation { kind: doc.kind,
                                                             detail: format!("composite_key {}", doc.composite_key) });
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(doc.id);
                }
            }
        }
        let updated = match coll.docs.get_mut(&doc.id) {
            Some(mut current) => {
                current.composite_key = doc.composite_key.clone();
                current.body = doc.body;
                current.value().clone()
            }
            None => {
                if key_changed {
                    coll.keys.remove_if(&doc.composite_key, |_, owner| *owner == doc.id);
                }
                return Ok(None);
            }
        };
        if key_changed {
            coll.keys.remove_if(&previous_key, |_, owner| *owner == doc.id);
        }
        Ok(Some(updated))
    }

    async fn delete(&self, kind: EntityKind, id: Uuid) -> Result<bool, StoreError> {
        let coll = self.collection(kind);
        let _writes = coll.writes.lock().await;
        match coll.docs.remove(&id) {
            Some((_, doc)) => {
                coll.keys.remove_if(&doc.composite_key, |_, owner| *owner == id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self, kind: EntityKind) -> Result<u64, StoreError> {
        Ok(self.collection(kind).docs.len() as u64)
    }

    async fn count_matching(&self, kind: EntityKind, probe: &Value) -> Result<u64, StoreError> {
        Ok(self.collection(kind)
               .docs
               .iter()
               .filter(|d| json_contains(&d.body, probe))
               .count() as u64)
    }
}
