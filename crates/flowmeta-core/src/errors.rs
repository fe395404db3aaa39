//! Errores del store de metadatos.
//!
//! `StoreError` es neutral respecto del backend (memoria o Postgres);
//! `MetaError` es la taxonomía que ve el llamador. Las cuatro primeras
//! variantes de `MetaError` son rechazos esperados, no defectos.

use thiserror::Error;

use flowmeta_domain::EntityKind;

use crate::integrity::{ForeignKeyViolation, ReferenceReport};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Violación del índice único (clave compuesta o id) detectada por el backend.
    #[error("unique violation on {kind}: {detail}")]
    UniqueViolation { kind: EntityKind, detail: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt document: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MetaError {
    #[error("{kind} not found: {lookup}")]
    NotFound { kind: EntityKind, lookup: String },
    #[error("{kind} with key '{key}' already exists")]
    DuplicateKey { kind: EntityKind, key: String },
    #[error("{0}")]
    ForeignKeyValidation(ForeignKeyViolation),
    #[error("{0}")]
    ReferentialIntegrity(ReferenceReport),
    #[error("store unavailable during {operation} on {kind}: {message}")]
    StoreUnavailable {
        kind: EntityKind,
        operation: &'static str,
        message: String,
    },
    #[error("deadline exceeded during {operation} on {kind}")]
    DeadlineExceeded { kind: EntityKind, operation: &'static str },
    #[error("invalid {kind} document: {message}")]
    InvalidDocument { kind: EntityKind, message: String },
}

impl MetaError {
    /// Nombre estable del tipo de error (campo `type` de las respuestas del router).
    pub fn error_type(&self) -> &'static str {
        match self {
            MetaError::NotFound { .. } => "NotFound",
            MetaError::DuplicateKey { .. } => "DuplicateKey",
            MetaError::ForeignKeyValidation(_) => "ForeignKeyValidation",
            MetaError::ReferentialIntegrity(_) => "ReferentialIntegrity",
            MetaError::StoreUnavailable { .. } => "StoreUnavailable",
            MetaError::DeadlineExceeded { .. } => "DeadlineExceeded",
            MetaError::InvalidDocument { .. } => "InvalidDocument",
        }
    }

    /// Rechazo esperado por el usuario (no es un fallo de infraestructura).
    pub fn is_rejection(&self) -> bool {
        matches!(self,
                 MetaError::NotFound { .. }
                 | MetaError::DuplicateKey { .. }
                 | MetaError::ForeignKeyValidation(_)
                 | MetaError::ReferentialIntegrity(_))
    }

    /// Traduce un error del backend. `key` es la forma legible de la clave
    /// involucrada, usada si el backend reporta violación de unicidad.
    pub fn from_store(kind: EntityKind, operation: &'static str, key: &str, err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { .. } => MetaError::DuplicateKey { kind,
                                                                            key: key.to_string() },
            StoreError::Corrupt(message) => MetaError::InvalidDocument { kind, message },
            StoreError::Unavailable(message) => MetaError::StoreUnavailable { kind,
                                                                              operation,
                                                                              message },
        }
    }
}
