//! flowmeta-rust
//!
//! Librería de arranque del store de metadatos:
//! - `config`: configuración desde entorno (`CONFIG`).
//! - `errors`: errores de los binarios.
//! - `telemetry`: subscriber de logs.
//! - `backend`: router sobre memoria o Postgres según la configuración.
//!
//! El dominio, el store y el backend Postgres viven en los crates
//! `flowmeta-domain`, `flowmeta-core` y `flowmeta-persistence`.

pub mod backend;
pub mod config;
pub mod errors;
pub mod telemetry;

pub use backend::{Backend, MemoryRouter, PostgresRouter};
pub use config::{AppConfig, DatabaseConfig, CONFIG};
pub use errors::AppError;
pub use telemetry::init_tracing;
