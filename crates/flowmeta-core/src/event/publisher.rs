use async_trait::async_trait;
use log::debug;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use super::ChangeEvent;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publish failed: {0}")]
    Failed(String),
}

/// Publicación fire-and-forget. Un error aquí se registra en el log y nunca
/// revierte la mutación ya confirmada.
#[async_trait]
pub trait EventPublisher: Send + Sync + 'static {
    async fn publish(&self, event: &ChangeEvent) -> Result<(), PublishError>;
}

/// Publicador que acumula los eventos en memoria (tests y demo).
#[derive(Default)]
pub struct InMemoryEventPublisher {
    inner: RwLock<Vec<ChangeEvent>>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<ChangeEvent> {
        self.inner.read().await.clone()
    }

    pub async fn events_for(&self, entity_id: Uuid) -> Vec<ChangeEvent> {
        self.inner
            .read()
            .await
            .iter()
            .filter(|e| e.entity_id == entity_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: &ChangeEvent) -> Result<(), PublishError> {
        self.inner.write().await.push(event.clone());
        Ok(())
    }
}

/// Difusión a suscriptores vía `tokio::sync::broadcast`. Sin suscriptores el
/// evento simplemente se descarta.
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<ChangeEvent>,
}

impl BroadcastEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventPublisher for BroadcastEventPublisher {
    async fn publish(&self, event: &ChangeEvent) -> Result<(), PublishError> {
        match self.sender.send(event.clone()) {
            Ok(receivers) => debug!("broadcast {} to {receivers} subscriber(s)", event.name()),
            Err(_) => debug!("broadcast {} dropped: no subscribers", event.name()),
        }
        Ok(())
    }
}
