use thiserror::Error;

use crate::EntityKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown entity kind: {0}")]
    UnknownKind(String),
    #[error("invalid composite key: {0}")]
    InvalidKey(String),
    #[error("entity kind mismatch: expected {expected}, got {actual}")]
    KindMismatch { expected: EntityKind, actual: EntityKind },
}
