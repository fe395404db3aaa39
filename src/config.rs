//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) una sola vez y expone una estructura
//! inmutable (`CONFIG`). Sin `DATABASE_URL` se usa el backend en memoria.

use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

use flowmeta_core::context::DEFAULT_ACTOR;
use flowmeta_core::RequestContext;

/// Configuración global de la aplicación.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `None` cuando no hay `DATABASE_URL`.
    pub database: Option<DatabaseConfig>,
    /// Actor por defecto de las mutaciones (`FLOWMETA_ACTOR`).
    pub actor: String,
    /// Plazo por petición (`FLOWMETA_REQUEST_TIMEOUT_MS`, 0 = sin plazo).
    pub request_timeout: Option<Duration>,
    /// Filtro de logs cuando `RUST_LOG` no está definido (`FLOWMETA_LOG`).
    pub log_filter: String,
}

/// Parámetros de conexión a la base de datos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// URL completa de conexión (postgres://...).
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    flowmeta_persistence::init_dotenv();
    AppConfig::from_env()
});

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda
    /// (permite testear sin tocar el entorno del proceso).
    pub fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let parse_u32 = |name: &str, default: u32| lookup(name).and_then(|v| v.parse().ok()).unwrap_or(default);
        let database = lookup("DATABASE_URL").filter(|url| !url.is_empty())
                                             .map(|url| DatabaseConfig { url,
                                                                         min_connections:
                                                                             parse_u32("DATABASE_MIN_CONNECTIONS", 2),
                                                                         max_connections:
                                                                             parse_u32("DATABASE_MAX_CONNECTIONS", 16) });
        let timeout_ms = lookup("FLOWMETA_REQUEST_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok())
                                                              .unwrap_or(DEFAULT_TIMEOUT_MS);
        Self { database,
               actor: lookup("FLOWMETA_ACTOR").filter(|a| !a.is_empty())
                                              .unwrap_or_else(|| DEFAULT_ACTOR.to_string()),
               request_timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
               log_filter: lookup("FLOWMETA_LOG").unwrap_or_else(|| "info".to_string()) }
    }

    /// Contexto de una petición nueva: actor por defecto y plazo contado
    /// desde ahora.
    pub fn request_context(&self) -> RequestContext {
        let ctx = RequestContext::new(self.actor.clone());
        match self.request_timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }
}
