//! Errores de los binarios. Los rechazos del store (`MetaError`) viajan como
//! respuestas del router; aquí sólo llegan fallos de arranque y de E/S.

use thiserror::Error;

use flowmeta_core::MetaError;
use flowmeta_persistence::PersistenceError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error de persistencia: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("Error del store: {0}")]
    Store(#[from] MetaError),
    #[error("Error en IO: {0}")]
    Io(String),
}
