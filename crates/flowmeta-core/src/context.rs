use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use flowmeta_domain::EntityKind;

use crate::errors::MetaError;

pub const DEFAULT_ACTOR: &str = "system";

/// Contexto de una petición: actor que firma la mutación y plazo opcional
/// para toda la E/S de la operación.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub actor: String,
    pub deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new(actor: impl Into<String>) -> Self {
        Self { actor: actor.into(),
               deadline: None }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Ejecuta `fut` dentro del plazo. Al vencer, el futuro se descarta; la
    /// escritura terminal de cada operación es una única operación atómica,
    /// por lo que no quedan escrituras parciales.
    pub async fn run<F, T>(&self, kind: EntityKind, operation: &'static str, fut: F) -> Result<T, MetaError>
        where F: Future<Output = Result<T, MetaError>>
    {
        match self.deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, fut).await {
                Ok(result) => result,
                Err(_) => {
                    log::warn!("{operation}: deadline exceeded kind={kind} actor={}", self.actor);
                    Err(MetaError::DeadlineExceeded { kind, operation })
                }
            },
            None => fut.await,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(DEFAULT_ACTOR)
    }
}
