//! flowmeta-persistence
//!
//! Backend Postgres (Diesel) del store de metadatos: documentos JSONB con
//! índice único `(kind, composite_key)` y publicador de eventos sobre la
//! tabla append-only `change_log`.
//!
//! Módulos:
//! - `pg`: `PgDocumentStore` y `PgChangeLogPublisher`, más utilidades de pool.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel declaradas para compilar queries.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_dev_pool_from_env, build_pool, ChangeLogRow, ConnectionProvider, PgChangeLogPublisher,
             PgDocumentStore, PgPool, PoolProvider};
