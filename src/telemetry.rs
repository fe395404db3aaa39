//! Inicialización de logs para los binarios: `tracing-subscriber` con
//! `EnvFilter`. Las librerías usan la fachada `log`; el subscriber también
//! captura esos registros.

use tracing_subscriber::EnvFilter;

use crate::errors::AppError;

/// `RUST_LOG` tiene prioridad; si falta, se usa `default_filter`. Los logs
/// van a stderr para no mezclarse con las respuestas en stdout.
pub fn init_tracing(default_filter: &str) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))
                                                  .map_err(|e| AppError::Config(format!("log filter: {e}")))?;
    tracing_subscriber::fmt().with_env_filter(filter)
                             .with_writer(std::io::stderr)
                             .try_init()
                             .map_err(|e| AppError::Config(format!("tracing init: {e}")))
}
