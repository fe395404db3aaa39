//! Unión etiquetada de todas las entidades, usada por el router de comandos
//! y por los payloads JSON de la CLI.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Address, Assignment, CompositeKey, Delivery, DomainError, Entity, EntityHeader, EntityKind, Flow,
            OrchestratedFlow, Processor, Schema, Step};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AnyEntity {
    Schema(Schema),
    Address(Address),
    Delivery(Delivery),
    Processor(Processor),
    Step(Step),
    Flow(Flow),
    Assignment(Assignment),
    OrchestratedFlow(OrchestratedFlow),
}

macro_rules! each_variant {
    ($self:expr, |$e:ident| $body:expr) => {
        match $self {
            AnyEntity::Schema($e) => $body,
            AnyEntity::Address($e) => $body,
            AnyEntity::Delivery($e) => $body,
            AnyEntity::Processor($e) => $body,
            AnyEntity::Step($e) => $body,
            AnyEntity::Flow($e) => $body,
            AnyEntity::Assignment($e) => $body,
            AnyEntity::OrchestratedFlow($e) => $body,
        }
    };
}

impl AnyEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            AnyEntity::Schema(_) => EntityKind::Schema,
            AnyEntity::Address(_) => EntityKind::Address,
            AnyEntity::Delivery(_) => EntityKind::Delivery,
            AnyEntity::Processor(_) => EntityKind::Processor,
            AnyEntity::Step(_) => EntityKind::Step,
            AnyEntity::Flow(_) => EntityKind::Flow,
            AnyEntity::Assignment(_) => EntityKind::Assignment,
            AnyEntity::OrchestratedFlow(_) => EntityKind::OrchestratedFlow,
        }
    }

    pub fn header(&self) -> &EntityHeader {
        each_variant!(self, |e| e.header())
    }

    pub fn id(&self) -> Uuid {
        self.header().id
    }

    pub fn composite_key(&self) -> CompositeKey {
        each_variant!(self, |e| e.composite_key())
    }

    /// Extrae la entidad tipada; falla si la variante no corresponde a `T`.
    pub fn into_typed<T: Entity>(self) -> Result<T, DomainError> {
        let actual = self.kind();
        T::from_any(self).ok_or(DomainError::KindMismatch { expected: T::KIND,
                                                            actual })
    }
}
