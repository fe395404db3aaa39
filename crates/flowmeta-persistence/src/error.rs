//! Errores de persistencia.
//! Mapea errores de Diesel / conexión a variantes semánticas y, hacia el
//! core, a `StoreError`.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use flowmeta_core::StoreError;
use flowmeta_domain::EntityKind;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    #[error("check violation: {0}")]
    CheckViolation(String),
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("not found")]
    NotFound,
    #[error("serialization conflict")]
    SerializationConflict,
    #[error("transient IO / connection pool error: {0}")]
    TransientIo(String),
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unknown database error: {0}")]
    Unknown(String),
}

impl PersistenceError {
    /// Traducción hacia el contrato del backend. Sólo la violación de unicidad
    /// conserva semántica propia (el store la convierte en `DuplicateKey`) y
    /// una fila ilegible es `Corrupt`; lo demás es indisponibilidad.
    pub fn into_store_error(self, kind: EntityKind) -> StoreError {
        match self {
            PersistenceError::UniqueViolation(detail) => StoreError::UniqueViolation { kind, detail },
            PersistenceError::Corrupt(msg) => StoreError::Corrupt(msg),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound,
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => Self::UniqueViolation(info.message().to_string()),
                DatabaseErrorKind::CheckViolation => Self::CheckViolation(info.message().to_string()),
                DatabaseErrorKind::ForeignKeyViolation => Self::ForeignKeyViolation(info.message().to_string()),
                DatabaseErrorKind::SerializationFailure => Self::SerializationConflict,
                DatabaseErrorKind::ClosedConnection => Self::TransientIo(info.message().to_string()),
                other => Self::Unknown(format!("db error kind {:?}: {}", other, info.message())),
            },
            DieselError::DeserializationError(e) => Self::Corrupt(e.to_string()),
            DieselError::SerializationError(e) => Self::Unknown(format!("ser: {e}")),
            DieselError::BrokenTransactionManager => Self::TransientIo("broken transaction manager".into()),
            DieselError::QueryBuilderError(e) => Self::Unknown(format!("query builder: {e}")),
            other => Self::Unknown(format!("unhandled diesel error: {other:?}")),
        }
    }
}
