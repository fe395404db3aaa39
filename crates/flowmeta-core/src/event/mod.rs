//! Eventos de cambio y publicadores.

mod publisher;
mod types;

pub use publisher::{BroadcastEventPublisher, EventPublisher, InMemoryEventPublisher, PublishError};
pub use types::{ChangeEvent, ChangeKind};
