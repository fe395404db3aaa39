//! Implementaciones Postgres (Diesel) de los traits del core.
//!
//! - `PgDocumentStore`: paridad 1:1 con `InMemoryDocumentStore`. Todas las
//!   entidades viven en `entity_documents` como JSONB; la restricción
//!   `UNIQUE (kind, composite_key)` es la autoridad final de unicidad y el
//!   conteo de referencias inversas usa contención `body @> probe` sobre el
//!   índice GIN.
//! - `PgChangeLogPublisher`: inserta cada evento en `change_log`
//!   (append-only).
//!
//! Diesel es bloqueante: cada operación toma una conexión del pool dentro de
//! `tokio::task::spawn_blocking`. Si el plazo de la petición vence, el
//! futuro se descarta pero la sentencia ya enviada puede completar; cada
//! escritura es una única sentencia, así que nunca queda a medias.
//!
//! No hay reintentos en esta capa: un error transitorio se reporta como
//! `StoreError::Unavailable` y el llamador decide.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel::sql_types::{BigInt, Jsonb, Text};
use log::{debug, warn};
use serde_json::Value;
use uuid::Uuid;

use flowmeta_core::{ChangeEvent, DocumentStore, EventPublisher, NewDocument, Page, PublishError, StoreError,
                    StoredDocument};
use flowmeta_domain::EntityKind;

use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::{change_log, entity_documents};

/// Alias de tipo para el pool r2d2 de conexiones Postgres.
///
/// El pool se construye con `min_idle` y `max_size`; al construirlo se corre
/// el set de migraciones pendientes (una sola vez).
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub type PgPooledConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Permite inyectar un pool real o un proveedor alternativo en tests sin
/// acoplar a r2d2. Debe devolver una conexión válida o
/// `PersistenceError::TransientIo`.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `PgPool`.
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Fila de `entity_documents` (orden de columnas del `table!`).
#[derive(Queryable, Debug)]
pub struct DocumentRow {
    pub seq: i64,
    pub kind: String,
    pub id: Uuid,
    pub composite_key: String,
    pub body: Value,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = entity_documents)]
pub struct NewDocumentRow<'a> {
    pub kind: &'a str,
    pub id: &'a Uuid,
    pub composite_key: &'a str,
    pub body: &'a Value,
}

/// Fila de `change_log` para lecturas (auditoría y tests).
#[derive(Queryable, Debug, Clone)]
pub struct ChangeLogRow {
    pub seq: i64,
    pub kind: String,
    pub entity_id: Uuid,
    pub change_type: String,
    pub actor: String,
    pub ts: DateTime<Utc>,
    pub payload: Value,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = change_log)]
pub struct NewChangeLogRow<'a> {
    pub kind: &'a str,
    pub entity_id: &'a Uuid,
    pub change_type: &'a str,
    pub actor: &'a str,
    pub ts: DateTime<Utc>,
    pub payload: &'a Value,
}

#[derive(QueryableByName, Debug)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    n: i64,
}

fn into_stored(row: DocumentRow) -> Result<StoredDocument, PersistenceError> {
    let kind = row.kind
                  .parse::<EntityKind>()
                  .map_err(|e| PersistenceError::Corrupt(format!("row {}: {e}", row.id)))?;
    Ok(StoredDocument { kind,
                        id: row.id,
                        composite_key: row.composite_key,
                        seq: row.seq as u64,
                        body: row.body })
}

/// Ejecuta `work` con una conexión del pool en el pool bloqueante de tokio.
async fn blocking<P, T, F>(provider: &Arc<P>, kind: EntityKind, work: F) -> Result<T, StoreError>
    where P: ConnectionProvider,
          T: Send + 'static,
          F: FnOnce(&mut PgConnection) -> Result<T, PersistenceError> + Send + 'static
{
    let provider = Arc::clone(provider);
    let joined = tokio::task::spawn_blocking(move || {
                     let mut conn = provider.connection()?;
                     work(&mut conn)
                 }).await;
    match joined {
        Ok(result) => result.map_err(|e| e.into_store_error(kind)),
        Err(e) => Err(StoreError::Unavailable(format!("blocking task failed: {e}"))),
    }
}

/// Backend de documentos sobre Postgres.
pub struct PgDocumentStore<P: ConnectionProvider> {
    provider: Arc<P>,
}

impl<P: ConnectionProvider> PgDocumentStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider: Arc::new(provider) }
    }
}

impl PgDocumentStore<PoolProvider> {
    pub fn from_pool(pool: PgPool) -> Self {
        Self::new(PoolProvider { pool })
    }
}

#[async_trait]
impl<P: ConnectionProvider> DocumentStore for PgDocumentStore<P> {
    async fn get_by_id(&self, kind: EntityKind, id: Uuid) -> Result<Option<StoredDocument>, StoreError> {
        blocking(&self.provider, kind, move |conn| {
            let row = entity_documents::table.filter(entity_documents::kind.eq(kind.as_str()))
                                             .filter(entity_documents::id.eq(id))
                                             .first::<DocumentRow>(conn)
                                             .optional()?;
            row.map(into_stored).transpose()
        }).await
    }

    async fn get_by_key(&self, kind: EntityKind, composite_key: &str) -> Result<Option<StoredDocument>, StoreError> {
        let composite_key = composite_key.to_string();
        blocking(&self.provider, kind, move |conn| {
            let row = entity_documents::table.filter(entity_documents::kind.eq(kind.as_str()))
                                             .filter(entity_documents::composite_key.eq(&composite_key))
                                             .first::<DocumentRow>(conn)
                                             .optional()?;
            row.map(into_stored).transpose()
        }).await
    }

    async fn list(&self, kind: EntityKind, page: Option<Page>) -> Result<Vec<StoredDocument>, StoreError> {
        blocking(&self.provider, kind, move |conn| {
            let mut query = entity_documents::table.filter(entity_documents::kind.eq(kind.as_str()))
                                                   .order(entity_documents::seq.asc())
                                                   .into_boxed();
            if let Some(page) = page {
                query = query.offset(page.offset() as i64).limit(i64::from(page.size));
            }
            let rows: Vec<DocumentRow> = query.load(conn)?;
            debug!("list kind={kind} rows={}", rows.len());
            rows.into_iter().map(into_stored).collect()
        }).await
    }

    async fn insert(&self, doc: NewDocument) -> Result<StoredDocument, StoreError> {
        let kind = doc.kind;
        blocking(&self.provider, kind, move |conn| {
            let seq: i64 = diesel::insert_into(entity_documents::table).values(NewDocumentRow { kind: kind.as_str(),
                                                                                                id: &doc.id,
                                                                                                composite_key:
                                                                                                    &doc.composite_key,
                                                                                                body: &doc.body })
                                                                       .returning(entity_documents::seq)
                                                                       .get_result(conn)?;
            Ok(StoredDocument { kind,
                                id: doc.id,
                                composite_key: doc.composite_key,
                                seq: seq as u64,
                                body: doc.body })
        }).await
    }

    async fn replace(&self, doc: NewDocument) -> Result<Option<StoredDocument>, StoreError> {
        let kind = doc.kind;
        blocking(&self.provider, kind, move |conn| {
            let target = entity_documents::table.filter(entity_documents::kind.eq(kind.as_str()))
                                                .filter(entity_documents::id.eq(doc.id));
            let seq: Option<i64> = diesel::update(target).set((entity_documents::composite_key.eq(&doc.composite_key),
                                                               entity_documents::body.eq(&doc.body)))
                                                         .returning(entity_documents::seq)
                                                         .get_result(conn)
                                                         .optional()?;
            Ok(seq.map(|seq| StoredDocument { kind,
                                              id: doc.id,
                                              composite_key: doc.composite_key,
                                              seq: seq as u64,
                                              body: doc.body }))
        }).await
    }

    async fn delete(&self, kind: EntityKind, id: Uuid) -> Result<bool, StoreError> {
        blocking(&self.provider, kind, move |conn| {
            let removed = diesel::delete(entity_documents::table.filter(entity_documents::kind.eq(kind.as_str()))
                                                                .filter(entity_documents::id.eq(id))).execute(conn)?;
            Ok(removed > 0)
        }).await
    }

    async fn count(&self, kind: EntityKind) -> Result<u64, StoreError> {
        blocking(&self.provider, kind, move |conn| {
            let n: i64 = entity_documents::table.filter(entity_documents::kind.eq(kind.as_str()))
                                                .count()
                                                .get_result(conn)?;
            Ok(n as u64)
        }).await
    }

    async fn count_matching(&self, kind: EntityKind, probe: &Value) -> Result<u64, StoreError> {
        let probe = probe.clone();
        blocking(&self.provider, kind, move |conn| {
            let row: CountRow =
                diesel::sql_query("SELECT COUNT(*) AS n FROM entity_documents WHERE kind = $1 AND body @> $2")
                    .bind::<Text, _>(kind.as_str())
                    .bind::<Jsonb, _>(probe)
                    .get_result(conn)?;
            Ok(row.n as u64)
        }).await
    }
}

/// Publicador que persiste los eventos en `change_log`.
///
/// La inserción ocurre después del commit de la mutación y en su propia
/// sentencia: si falla, el evento se pierde y la mutación se conserva.
pub struct PgChangeLogPublisher<P: ConnectionProvider> {
    provider: Arc<P>,
}

impl<P: ConnectionProvider> PgChangeLogPublisher<P> {
    pub fn new(provider: P) -> Self {
        Self { provider: Arc::new(provider) }
    }

    /// Eventos de una entidad en orden de `seq`.
    pub async fn list_for(&self, entity_id: Uuid) -> Result<Vec<ChangeLogRow>, PersistenceError> {
        let provider = Arc::clone(&self.provider);
        let joined = tokio::task::spawn_blocking(move || {
                         let mut conn = provider.connection()?;
                         change_log::table.filter(change_log::entity_id.eq(entity_id))
                                          .order(change_log::seq.asc())
                                          .load::<ChangeLogRow>(&mut conn)
                                          .map_err(PersistenceError::from)
                     }).await;
        joined.map_err(|e| PersistenceError::TransientIo(format!("blocking task failed: {e}")))?
    }
}

impl PgChangeLogPublisher<PoolProvider> {
    pub fn from_pool(pool: PgPool) -> Self {
        Self::new(PoolProvider { pool })
    }
}

#[async_trait]
impl<P: ConnectionProvider> EventPublisher for PgChangeLogPublisher<P> {
    async fn publish(&self, event: &ChangeEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_value(event).map_err(|e| PublishError::Failed(format!("serialize: {e}")))?;
        let event = event.clone();
        let provider = Arc::clone(&self.provider);
        let joined = tokio::task::spawn_blocking(move || {
                         let mut conn = provider.connection()?;
                         diesel::insert_into(change_log::table).values(NewChangeLogRow { kind: event.kind.as_str(),
                                                                                         entity_id: &event.entity_id,
                                                                                         change_type:
                                                                                             event.change.as_str(),
                                                                                         actor: &event.actor,
                                                                                         ts: event.ts,
                                                                                         payload: &payload })
                                                               .execute(&mut conn)
                                                               .map_err(PersistenceError::from)
                     }).await;
        match joined {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => {
                warn!("change_log insert failed: {e}");
                Err(PublishError::Failed(e.to_string()))
            }
            Err(e) => Err(PublishError::Failed(format!("blocking task failed: {e}"))),
        }
    }
}

/// Construye un pool Postgres r2d2 a partir de URL y corre las migraciones
/// pendientes con la primera conexión.
///
/// Si `min_size > max_size`, se usa `min_size = max_size`. Errores del pool o
/// del manager se devuelven como `PersistenceError::TransientIo`.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let validated_min = min_size.max(1);
    let validated_max = max_size.max(1);
    if validated_min > validated_max {
        warn!("min_size > max_size ({validated_min} > {validated_max}), ajustando min=max");
    }
    let final_min = validated_min.min(validated_max);
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(final_min))
                                    .max_size(validated_max)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    Ok(pool)
}

/// Helper de desarrollo: carga `.env`, lee configuración (DATABASE_URL,
/// tamaños) y construye un pool ya migrado.
pub fn build_dev_pool_from_env() -> Result<PgPool, PersistenceError> {
    let cfg = crate::config::DbConfig::from_env()?;
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}
