//! Validador de integridad referencial.
//!
//! Dos chequeos independientes y de sólo lectura, sin bloqueos:
//! - hacia adelante: cada FK del documento apunta a una fila existente;
//! - hacia atrás: ninguna otra fila apunta a `(kind, id)` antes de borrarla o
//!   de cambiar su clave compuesta.
//!
//! El chequeo hacia atrás y la escritura posterior no son atómicos: una
//! referencia creada entre ambos no se detecta.

use std::sync::Arc;

use log::debug;
use serde_json::Value;
use uuid::Uuid;

use flowmeta_domain::{EntityKind, EntityRef};

use super::report::{BlockedOperation, ForeignKeyViolation, ReferenceReport, ViolationReason};
use crate::catalog::{Cardinality, ReferenceCatalog, ReferenceField, ReferenceTarget, Requirement};
use crate::document::DocumentStore;
use crate::errors::MetaError;

pub struct IntegrityValidator<D: DocumentStore> {
    store: Arc<D>,
    catalog: Arc<ReferenceCatalog>,
}

impl<D: DocumentStore> IntegrityValidator<D> {
    pub fn new(store: Arc<D>, catalog: Arc<ReferenceCatalog>) -> Self {
        Self { store, catalog }
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    /// Chequeo hacia adelante sobre el documento JSON de una entidad `kind`.
    /// Las listas se validan elemento a elemento y fallan en el primero que
    /// no exista.
    pub async fn validate_foreign_keys(&self, kind: EntityKind, body: &Value) -> Result<(), MetaError> {
        for field in self.catalog.outgoing(kind) {
            let raw = body.get(field.field).unwrap_or(&Value::Null);
            match (field.cardinality, raw) {
                (Cardinality::Single, _) => self.check_element(field, raw, None).await?,
                (Cardinality::List, Value::Null) => {}
                (Cardinality::List, Value::Array(items)) => {
                    for (i, item) in items.iter().enumerate() {
                        self.check_element(field, item, Some(i)).await?;
                    }
                }
                (Cardinality::List, other) => {
                    return Err(MetaError::InvalidDocument { kind,
                                                            message: format!("{} must be a list, got {other}", field.label) });
                }
            }
        }
        Ok(())
    }

    async fn check_element(&self, field: &ReferenceField, raw: &Value, index: Option<usize>) -> Result<(), MetaError> {
        let (referenced, id) = match field.target {
            ReferenceTarget::Kind(target) => (target, parse_id(field, raw)?),
            ReferenceTarget::Tagged(allowed) => {
                let tagged: EntityRef =
                    serde_json::from_value(raw.clone()).map_err(|e| MetaError::InvalidDocument { kind: field.source,
                                                                                                 message: format!("{}: {e}", field.label) })?;
                if !allowed.contains(&tagged.kind) {
                    return Err(violation(field, tagged.kind, tagged.id.to_string(), index, ViolationReason::KindNotAllowed));
                }
                (tagged.kind, Some(tagged.id).filter(|id| !id.is_nil()))
            }
        };

        let Some(id) = id else {
            // Centinela vacío: sólo un campo simple opcional puede omitirse.
            if index.is_none() && field.requirement == Requirement::Optional {
                return Ok(());
            }
            return Err(violation(field, referenced, String::new(), index, ViolationReason::Empty));
        };

        let exists = self.store
                         .exists_by_id(referenced, id)
                         .await
                         .map_err(|e| MetaError::from_store(field.source, "validate_foreign_keys", "", e))?;
        if !exists {
            debug!("fk missing source={} field={} target={referenced} id={id}", field.source, field.label);
            return Err(violation(field, referenced, id.to_string(), index, ViolationReason::Missing));
        }
        Ok(())
    }

    /// Cuenta, por tipo origen, las filas que hoy apuntan a `(kind, id)`.
    pub async fn reference_report(&self,
                                  kind: EntityKind,
                                  id: Uuid,
                                  operation: BlockedOperation)
                                  -> Result<ReferenceReport, MetaError> {
        let mut report = ReferenceReport::new(kind, id, operation);
        for field in self.catalog.incoming(kind) {
            let probe = field.probe(kind, id);
            let count = self.store
                            .count_matching(field.source, &probe)
                            .await
                            .map_err(|e| MetaError::from_store(kind, "count_references", "", e))?;
            report.add(field.source, count);
        }
        debug!("reference_report kind={kind} id={id} total={}", report.total());
        Ok(report)
    }

    /// Chequeo hacia atrás previo a un borrado.
    pub async fn validate_deletion(&self, kind: EntityKind, id: Uuid) -> Result<(), MetaError> {
        self.reject_if_referenced(kind, id, BlockedOperation::Delete).await
    }

    /// Chequeo hacia atrás previo a un update que cambia la clave compuesta.
    /// Los updates que conservan la clave no deben llamarlo.
    pub async fn validate_update(&self, kind: EntityKind, id: Uuid) -> Result<(), MetaError> {
        self.reject_if_referenced(kind, id, BlockedOperation::Modify).await
    }

    async fn reject_if_referenced(&self, kind: EntityKind, id: Uuid, operation: BlockedOperation) -> Result<(), MetaError> {
        let report = self.reference_report(kind, id, operation).await?;
        if report.has_references() {
            return Err(MetaError::ReferentialIntegrity(report));
        }
        Ok(())
    }
}

fn parse_id(field: &ReferenceField, raw: &Value) -> Result<Option<Uuid>, MetaError> {
    match raw {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => {
            let id = Uuid::parse_str(s).map_err(|e| MetaError::InvalidDocument { kind: field.source,
                                                                                 message: format!("{}: {e}", field.label) })?;
            Ok(Some(id).filter(|id| !id.is_nil()))
        }
        other => Err(MetaError::InvalidDocument { kind: field.source,
                                                  message: format!("{} must be an id, got {other}", field.label) }),
    }
}

fn violation(field: &ReferenceField,
             referenced: EntityKind,
             value: String,
             index: Option<usize>,
             reason: ViolationReason)
             -> MetaError {
    MetaError::ForeignKeyValidation(ForeignKeyViolation { kind: field.source,
                                                          field: field.label,
                                                          referenced,
                                                          value,
                                                          index,
                                                          reason })
}
