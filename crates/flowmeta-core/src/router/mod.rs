//! Router de comandos: traduce `{Create|Update|Delete|Get}<Kind>` en llamadas
//! al `EntityStore` tipado y devuelve respuestas estructuradas.
//!
//! Los rechazos esperados (NotFound, DuplicateKey, ForeignKeyValidation,
//! ReferentialIntegrity) se devuelven como `Reply::Failure` con el mensaje
//! listo para mostrar al usuario; no son defectos.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use flowmeta_domain::{Address, AnyEntity, Assignment, CompositeKey, Delivery, Entity, EntityKind, Flow, OrchestratedFlow,
                      Processor, Schema, Step};

use crate::context::RequestContext;
use crate::document::{DocumentStore, Page};
use crate::errors::MetaError;
use crate::event::EventPublisher;
use crate::integrity::ReferenceCount;
use crate::store::MetadataStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Create { entity: AnyEntity },
    Update { entity: AnyEntity },
    Delete { kind: EntityKind, id: Uuid },
    Get { kind: EntityKind, id: Uuid },
    GetByKey { kind: EntityKind, key: Vec<String> },
    List {
        kind: EntityKind,
        #[serde(default)]
        page: Option<Page>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub error: String,
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<ReferenceCount>>,
}

impl From<&MetaError> for Failure {
    fn from(err: &MetaError) -> Self {
        let references = match err {
            MetaError::ReferentialIntegrity(report) => Some(report.breakdown()),
            _ => None,
        };
        Self { error: err.to_string(),
               error_type: err.error_type().to_string(),
               references }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply {
    Entity { entity: AnyEntity },
    Entities { items: Vec<AnyEntity> },
    Deleted { deleted: bool },
    NotFound { kind: EntityKind },
    Failure(Failure),
}

impl Reply {
    pub fn is_failure(&self) -> bool {
        matches!(self, Reply::Failure(_))
    }
}

/// Enlaza un alias de tipo `$t` con la entidad concreta de `$kind`.
macro_rules! with_entity_type {
    ($kind:expr, $t:ident => $body:expr) => {
        match $kind {
            EntityKind::Schema => {
                type $t = Schema;
                $body
            }
            EntityKind::Address => {
                type $t = Address;
                $body
            }
            EntityKind::Delivery => {
                type $t = Delivery;
                $body
            }
            EntityKind::Processor => {
                type $t = Processor;
                $body
            }
            EntityKind::Step => {
                type $t = Step;
                $body
            }
            EntityKind::Flow => {
                type $t = Flow;
                $body
            }
            EntityKind::Assignment => {
                type $t = Assignment;
                $body
            }
            EntityKind::OrchestratedFlow => {
                type $t = OrchestratedFlow;
                $body
            }
        }
    };
}

pub struct CommandRouter<D: DocumentStore, P: EventPublisher> {
    store: MetadataStore<D, P>,
}

impl<D: DocumentStore, P: EventPublisher> CommandRouter<D, P> {
    pub fn new(store: MetadataStore<D, P>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MetadataStore<D, P> {
        &self.store
    }

    pub async fn handle(&self, ctx: &RequestContext, command: Command) -> Reply {
        let result = match command {
            Command::Create { entity } => with_entity_type!(entity.kind(), T => self.create::<T>(ctx, entity).await),
            Command::Update { entity } => with_entity_type!(entity.kind(), T => self.update::<T>(ctx, entity).await),
            Command::Delete { kind, id } => with_entity_type!(kind, T => self.delete::<T>(ctx, id).await),
            Command::Get { kind, id } => with_entity_type!(kind, T => self.get::<T>(ctx, id).await),
            Command::GetByKey { kind, key } => {
                let key = CompositeKey::new(key);
                with_entity_type!(kind, T => self.get_by_key::<T>(ctx, &key).await)
            }
            Command::List { kind, page } => with_entity_type!(kind, T => self.list::<T>(ctx, page).await),
        };
        result.unwrap_or_else(|err| {
                  if !err.is_rejection() {
                      log::error!("command failed: {err}");
                  }
                  Reply::Failure(Failure::from(&err))
              })
    }

    async fn create<T: Entity>(&self, ctx: &RequestContext, entity: AnyEntity) -> Result<Reply, MetaError> {
        let entity = typed::<T>(entity)?;
        let created = self.store.entities::<T>().create(ctx, entity).await?;
        Ok(Reply::Entity { entity: created.into_any() })
    }

    async fn update<T: Entity>(&self, ctx: &RequestContext, entity: AnyEntity) -> Result<Reply, MetaError> {
        let entity = typed::<T>(entity)?;
        let updated = self.store.entities::<T>().update(ctx, entity).await?;
        Ok(Reply::Entity { entity: updated.into_any() })
    }

    async fn delete<T: Entity>(&self, ctx: &RequestContext, id: Uuid) -> Result<Reply, MetaError> {
        let deleted = self.store.entities::<T>().delete(ctx, id).await?;
        Ok(Reply::Deleted { deleted })
    }

    async fn get<T: Entity>(&self, ctx: &RequestContext, id: Uuid) -> Result<Reply, MetaError> {
        found(self.store.entities::<T>().get_by_id(ctx, id).await)
    }

    async fn get_by_key<T: Entity>(&self, ctx: &RequestContext, key: &CompositeKey) -> Result<Reply, MetaError> {
        found(self.store.entities::<T>().get_by_composite_key(ctx, key).await)
    }

    async fn list<T: Entity>(&self, ctx: &RequestContext, page: Option<Page>) -> Result<Reply, MetaError> {
        let store = self.store.entities::<T>();
        let items = match page {
            Some(page) => store.get_paged(ctx, page).await?,
            None => store.get_all(ctx).await?,
        };
        Ok(Reply::Entities { items: items.into_iter().map(T::into_any).collect() })
    }
}

/// En consultas, NotFound es una respuesta normal y no un fallo.
fn found<T: Entity>(result: Result<T, MetaError>) -> Result<Reply, MetaError> {
    match result {
        Ok(entity) => Ok(Reply::Entity { entity: entity.into_any() }),
        Err(MetaError::NotFound { kind, .. }) => Ok(Reply::NotFound { kind }),
        Err(e) => Err(e),
    }
}

fn typed<T: Entity>(entity: AnyEntity) -> Result<T, MetaError> {
    entity.into_typed::<T>().map_err(|e| MetaError::InvalidDocument { kind: T::KIND,
                                                                      message: e.to_string() })
}
