//! Selección del backend según la configuración: Postgres (documentos +
//! `change_log`) o memoria (con difusión de eventos por `broadcast`).

use flowmeta_core::{BroadcastEventPublisher, Command, CommandRouter, InMemoryDocumentStore, MetadataStore, Reply,
                    RequestContext};
use flowmeta_persistence::{build_pool, PgChangeLogPublisher, PgDocumentStore, PoolProvider};

use crate::config::AppConfig;
use crate::errors::AppError;

pub type MemoryRouter = CommandRouter<InMemoryDocumentStore, BroadcastEventPublisher>;
pub type PostgresRouter = CommandRouter<PgDocumentStore<PoolProvider>, PgChangeLogPublisher<PoolProvider>>;

/// Capacidad del canal de eventos del backend en memoria.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

pub enum Backend {
    Memory(MemoryRouter),
    Postgres(PostgresRouter),
}

impl Backend {
    pub fn memory() -> Self {
        let store = MetadataStore::new(InMemoryDocumentStore::new(), BroadcastEventPublisher::new(EVENT_CHANNEL_CAPACITY));
        Backend::Memory(CommandRouter::new(store))
    }

    /// Postgres si la configuración trae base de datos; el pool se construye
    /// (y migra) fuera del runtime asíncrono.
    pub async fn from_config(cfg: &AppConfig) -> Result<Self, AppError> {
        let Some(db) = cfg.database.clone() else {
            log::info!("DATABASE_URL no definido: backend en memoria");
            return Ok(Self::memory());
        };
        let pool = tokio::task::spawn_blocking(move || build_pool(&db.url, db.min_connections, db.max_connections))
            .await
            .map_err(|e| AppError::Config(format!("pool task: {e}")))??;
        let store = MetadataStore::new(PgDocumentStore::from_pool(pool.clone()), PgChangeLogPublisher::from_pool(pool));
        Ok(Backend::Postgres(CommandRouter::new(store)))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Memory(_) => "memory",
            Backend::Postgres(_) => "postgres",
        }
    }

    pub async fn handle(&self, ctx: &RequestContext, command: Command) -> Reply {
        match self {
            Backend::Memory(router) => router.handle(ctx, command).await,
            Backend::Postgres(router) => router.handle(ctx, command).await,
        }
    }
}
