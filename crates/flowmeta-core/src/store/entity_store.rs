use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};
use serde_json::Value;
use uuid::Uuid;

use flowmeta_domain::{CompositeKey, Entity, EntityHeader};

use crate::context::RequestContext;
use crate::document::{DocumentStore, NewDocument, Page, StoredDocument};
use crate::errors::{MetaError, StoreError};
use crate::event::{ChangeEvent, ChangeKind, EventPublisher};
use crate::integrity::IntegrityValidator;

/// Operaciones CRUD de un tipo de entidad `T`.
///
/// Garantías:
/// - unicidad de la clave compuesta: precondición de lectura y, como
///   autoridad final, el índice único del backend (su violación se traduce al
///   mismo `DuplicateKey`);
/// - FKs validadas antes de cada create/update;
/// - borrado y cambio de clave rechazados mientras existan referencias
///   inversas (sin cascada);
/// - evento publicado sólo tras una escritura confirmada.
pub struct EntityStore<T: Entity, D: DocumentStore, P: EventPublisher> {
    documents: Arc<D>,
    validator: Arc<IntegrityValidator<D>>,
    publisher: Arc<P>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity, D: DocumentStore, P: EventPublisher> EntityStore<T, D, P> {
    pub(crate) fn new(documents: Arc<D>, validator: Arc<IntegrityValidator<D>>, publisher: Arc<P>) -> Self {
        Self { documents,
               validator,
               publisher,
               _entity: PhantomData }
    }

    pub async fn get_by_id(&self, ctx: &RequestContext, id: Uuid) -> Result<T, MetaError> {
        ctx.run(T::KIND, "get_by_id", async {
               let doc = self.documents
                             .get_by_id(T::KIND, id)
                             .await
                             .map_err(|e| self.store_error("get_by_id", &id.to_string(), e))?;
               match doc {
                   Some(doc) => decode(doc),
                   None => Err(not_found::<T>(format!("id {id}"))),
               }
           })
           .await
    }

    pub async fn get_by_composite_key(&self, ctx: &RequestContext, key: &CompositeKey) -> Result<T, MetaError> {
        ctx.run(T::KIND, "get_by_composite_key", async {
               let doc = self.documents
                             .get_by_key(T::KIND, &key.storage_form())
                             .await
                             .map_err(|e| self.store_error("get_by_composite_key", &key.to_string(), e))?;
               match doc {
                   Some(doc) => decode(doc),
                   None => Err(not_found::<T>(format!("key {key}"))),
               }
           })
           .await
    }

    /// Todas las filas en orden de inserción.
    pub async fn get_all(&self, ctx: &RequestContext) -> Result<Vec<T>, MetaError> {
        self.list(ctx, None).await
    }

    /// Página base cero en orden de inserción; reiniciable.
    pub async fn get_paged(&self, ctx: &RequestContext, page: Page) -> Result<Vec<T>, MetaError> {
        self.list(ctx, Some(page)).await
    }

    async fn list(&self, ctx: &RequestContext, page: Option<Page>) -> Result<Vec<T>, MetaError> {
        ctx.run(T::KIND, "list", async {
               let docs = self.documents
                              .list(T::KIND, page)
                              .await
                              .map_err(|e| self.store_error("list", "", e))?;
               docs.into_iter().map(decode::<T>).collect()
           })
           .await
    }

    pub async fn exists(&self, ctx: &RequestContext, key: &CompositeKey) -> Result<bool, MetaError> {
        ctx.run(T::KIND, "exists", async {
               self.documents
                   .exists_by_key(T::KIND, &key.storage_form())
                   .await
                   .map_err(|e| self.store_error("exists", &key.to_string(), e))
           })
           .await
    }

    pub async fn exists_by_id(&self, ctx: &RequestContext, id: Uuid) -> Result<bool, MetaError> {
        ctx.run(T::KIND, "exists_by_id", async {
               self.documents
                   .exists_by_id(T::KIND, id)
                   .await
                   .map_err(|e| self.store_error("exists_by_id", &id.to_string(), e))
           })
           .await
    }

    pub async fn count(&self, ctx: &RequestContext) -> Result<u64, MetaError> {
        ctx.run(T::KIND, "count", async {
               self.documents.count(T::KIND).await.map_err(|e| self.store_error("count", "", e))
           })
           .await
    }

    /// Crea la entidad con id generado y auditoría asignada por el store. Los
    /// valores de cabecera enviados por el cliente (salvo la descripción) se
    /// ignoran.
    pub async fn create(&self, ctx: &RequestContext, entity: T) -> Result<T, MetaError> {
        let (created, event) = ctx.run(T::KIND, "create", self.create_inner(ctx, entity)).await?;
        self.emit(event).await;
        Ok(created)
    }

    async fn create_inner(&self, ctx: &RequestContext, mut entity: T) -> Result<(T, ChangeEvent), MetaError> {
        let key = entity.composite_key();
        let storage_key = key.storage_form();
        debug!("create:start kind={} key={key}", T::KIND);

        let taken = self.documents
                        .exists_by_key(T::KIND, &storage_key)
                        .await
                        .map_err(|e| self.store_error("create", &key.to_string(), e))?;
        if taken {
            info!("create:rejected kind={} key={key}: duplicate", T::KIND);
            return Err(MetaError::DuplicateKey { kind: T::KIND,
                                                 key: key.to_string() });
        }

        self.validator.validate_foreign_keys(T::KIND, &encode::<T>(&entity)?).await?;

        let now = Utc::now();
        let description = std::mem::take(&mut entity.header_mut().description);
        *entity.header_mut() = EntityHeader { id: Uuid::new_v4(),
                                              description,
                                              created_at: Some(now),
                                              created_by: Some(ctx.actor.clone()),
                                              updated_at: None,
                                              updated_by: None };
        let body = encode::<T>(&entity)?;
        let doc = NewDocument { kind: T::KIND,
                                id: entity.id(),
                                composite_key: storage_key,
                                body: body.clone() };
        // El índice único del backend decide las carreras entre creates concurrentes.
        self.documents
            .insert(doc)
            .await
            .map_err(|e| self.store_error("create", &key.to_string(), e))?;

        debug!("create:done kind={} id={} key={key}", T::KIND, entity.id());
        let event = ChangeEvent::new(T::KIND, entity.id(), ChangeKind::Created { snapshot: body }, &ctx.actor, now);
        Ok((entity, event))
    }

    /// Reemplazo completo. Si la clave compuesta cambia, exige que nadie
    /// referencie a la entidad y que la nueva clave esté libre.
    pub async fn update(&self, ctx: &RequestContext, entity: T) -> Result<T, MetaError> {
        let (updated, event) = ctx.run(T::KIND, "update", self.update_inner(ctx, entity)).await?;
        self.emit(event).await;
        Ok(updated)
    }

    async fn update_inner(&self, ctx: &RequestContext, mut entity: T) -> Result<(T, ChangeEvent), MetaError> {
        let id = entity.id();
        if id.is_nil() {
            return Err(not_found::<T>("id <empty>".to_string()));
        }
        debug!("update:start kind={} id={id}", T::KIND);

        let existing = self.documents
                           .get_by_id(T::KIND, id)
                           .await
                           .map_err(|e| self.store_error("update", &id.to_string(), e))?
                           .ok_or_else(|| not_found::<T>(format!("id {id}")))?;
        let previous: T = decode(existing.clone())?;

        let key = entity.composite_key();
        let storage_key = key.storage_form();
        if storage_key != existing.composite_key {
            self.validator.validate_update(T::KIND, id).await?;
            let taken = self.documents
                            .exists_by_key(T::KIND, &storage_key)
                            .await
                            .map_err(|e| self.store_error("update", &key.to_string(), e))?;
            if taken {
                info!("update:rejected kind={} id={id} key={key}: duplicate", T::KIND);
                return Err(MetaError::DuplicateKey { kind: T::KIND,
                                                     key: key.to_string() });
            }
        }

        self.validator.validate_foreign_keys(T::KIND, &encode::<T>(&entity)?).await?;

        let now = Utc::now();
        let description = std::mem::take(&mut entity.header_mut().description);
        let created = previous.header();
        *entity.header_mut() = EntityHeader { id,
                                              description,
                                              created_at: created.created_at,
                                              created_by: created.created_by.clone(),
                                              updated_at: Some(now),
                                              updated_by: Some(ctx.actor.clone()) };
        let body = encode::<T>(&entity)?;
        let replaced = self.documents
                           .replace(NewDocument { kind: T::KIND,
                                                  id,
                                                  composite_key: storage_key,
                                                  body: body.clone() })
                           .await
                           .map_err(|e| self.store_error("update", &key.to_string(), e))?;
        if replaced.is_none() {
            // Borrada entre la lectura y el reemplazo.
            return Err(not_found::<T>(format!("id {id}")));
        }

        debug!("update:done kind={} id={id} key={key}", T::KIND);
        let event = ChangeEvent::new(T::KIND, id, ChangeKind::Updated { snapshot: body }, &ctx.actor, now);
        Ok((entity, event))
    }

    /// Borrado físico, rechazado si existen referencias inversas. Devuelve si
    /// había fila; sólo entonces se publica `Deleted`.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> Result<bool, MetaError> {
        let removed = ctx.run(T::KIND, "delete", async {
                             debug!("delete:start kind={} id={id}", T::KIND);
                             self.validator.validate_deletion(T::KIND, id).await?;
                             self.documents
                                 .delete(T::KIND, id)
                                 .await
                                 .map_err(|e| self.store_error("delete", &id.to_string(), e))
                         })
                         .await?;
        if removed {
            self.emit(ChangeEvent::new(T::KIND, id, ChangeKind::Deleted, &ctx.actor, Utc::now()))
                .await;
        }
        debug!("delete:done kind={} id={id} removed={removed}", T::KIND);
        Ok(removed)
    }

    async fn emit(&self, event: ChangeEvent) {
        if let Err(e) = self.publisher.publish(&event).await {
            warn!("publish {} failed for id={} (mutation kept): {e}", event.name(), event.entity_id);
        }
    }

    fn store_error(&self, operation: &'static str, lookup: &str, err: StoreError) -> MetaError {
        let mapped = MetaError::from_store(T::KIND, operation, lookup, err);
        match &mapped {
            MetaError::StoreUnavailable { message, .. } => {
                error!("{operation} failed kind={} lookup={lookup}: {message}", T::KIND)
            }
            MetaError::DuplicateKey { .. } => info!("{operation}:rejected kind={} key={lookup}: unique constraint", T::KIND),
            _ => warn!("{operation} kind={} lookup={lookup}: {mapped}", T::KIND),
        }
        mapped
    }
}

fn not_found<T: Entity>(lookup: String) -> MetaError {
    MetaError::NotFound { kind: T::KIND, lookup }
}

fn encode<T: Entity>(entity: &T) -> Result<Value, MetaError> {
    serde_json::to_value(entity).map_err(|e| MetaError::InvalidDocument { kind: T::KIND,
                                                                          message: e.to_string() })
}

fn decode<T: Entity>(doc: StoredDocument) -> Result<T, MetaError> {
    serde_json::from_value(doc.body).map_err(|e| MetaError::InvalidDocument { kind: T::KIND,
                                                                              message: format!("id {}: {e}", doc.id) })
}
