//! Demo del store de metadatos en memoria: arma un grafo pequeño
//! (Schema -> Processor -> Step -> Flow -> OrchestratedFlow) y muestra los
//! rechazos de integridad y los eventos emitidos.

use flowmeta_core::domain::{Entity, EntityKind, Flow, OrchestratedFlow, Processor, Schema, Step};
use flowmeta_core::{BroadcastEventPublisher, Command, CommandRouter, InMemoryDocumentStore, MetadataStore, Reply};
use flowmeta_rust::backend::EVENT_CHANNEL_CAPACITY;
use flowmeta_rust::{init_tracing, AppError, CONFIG};
use uuid::Uuid;

fn created_id(label: &str, reply: &Reply) -> Result<Uuid, AppError> {
    match reply {
        Reply::Entity { entity } => {
            println!("  + {label}: {}", entity.id());
            Ok(entity.id())
        }
        other => Err(AppError::Config(format!("{label}: respuesta inesperada {other:?}"))),
    }
}

fn show(label: &str, reply: &Reply) {
    match reply {
        Reply::Failure(failure) => println!("  x {label}: [{}] {}", failure.error_type, failure.error),
        Reply::Deleted { deleted } => println!("  - {label}: deleted={deleted}"),
        other => println!("  = {label}: {other:?}"),
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    if let Err(e) = init_tracing(&CONFIG.log_filter) {
        eprintln!("{e}");
    }

    let publisher = BroadcastEventPublisher::new(EVENT_CHANNEL_CAPACITY);
    let mut events = publisher.subscribe();
    let router = CommandRouter::new(MetadataStore::new(InMemoryDocumentStore::new(), publisher));
    let ctx = CONFIG.request_context();
    let create = |entity: flowmeta_core::domain::AnyEntity| Command::Create { entity };

    println!("== Schema compartido por entrada y salida de un Processor");
    let s1 = created_id("Schema v1:Sch", &router.handle(&ctx, create(Schema::new("v1", "Sch").into_any())).await)?;
    let p1 = created_id("Processor v1:P1",
                        &router.handle(&ctx, create(Processor::new("v1", "P1", s1, s1).into_any())).await)?;
    show("delete Schema", &router.handle(&ctx, Command::Delete { kind: EntityKind::Schema, id: s1 }).await);

    println!("== Step con ProcessorId inexistente");
    show("create Step",
         &router.handle(&ctx, create(Step::new("v1", "orphan", Uuid::new_v4()).into_any())).await);

    println!("== Flow orquestado");
    let st1 = created_id("Step v1:St1", &router.handle(&ctx, create(Step::new("v1", "St1", p1).into_any())).await)?;
    let f1 = created_id("Flow v1:F1", &router.handle(&ctx, create(Flow::new("v1", "F1", vec![st1]).into_any())).await)?;
    let of1 = created_id("OrchestratedFlow v1:OF1",
                         &router.handle(&ctx, create(OrchestratedFlow::new("v1", "OF1", f1, vec![]).into_any()))
                                .await)?;
    show("delete Flow", &router.handle(&ctx, Command::Delete { kind: EntityKind::Flow, id: f1 }).await);
    show("delete OrchestratedFlow",
         &router.handle(&ctx, Command::Delete { kind: EntityKind::OrchestratedFlow, id: of1 }).await);
    show("delete Flow", &router.handle(&ctx, Command::Delete { kind: EntityKind::Flow, id: f1 }).await);

    println!("== Clave duplicada");
    show("create Schema", &router.handle(&ctx, create(Schema::new("v1", "Sch").into_any())).await);

    println!("== Eventos");
    while let Ok(event) = events.try_recv() {
        println!("  {} id={} actor={}", event.name(), event.entity_id, event.actor);
    }
    Ok(())
}
