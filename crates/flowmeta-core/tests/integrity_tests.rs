mod common;

use common::{ctx, memory_store, processor, schema};
use flowmeta_core::domain::{Address, Assignment, Delivery, EntityKind, EntityRef, Flow, OrchestratedFlow, Processor, Schema,
                            Step};
use flowmeta_core::{BlockedOperation, InMemoryDocumentStore, InMemoryEventPublisher, MetaError, MetadataStore,
                    ReferenceCatalog, ReferenceField, ViolationReason};
use uuid::Uuid;

#[tokio::test]
async fn schema_shared_by_processor_input_and_output_counts_twice() {
    let (store, _) = memory_store();
    let s1 = schema(&store, "v1", "Sch").await;
    processor(&store, "P1", s1.header.id, s1.header.id).await;

    let err = store.entities::<Schema>().delete(&ctx(), s1.header.id).await.unwrap_err();
    let MetaError::ReferentialIntegrity(report) = &err else {
        panic!("expected ReferentialIntegrity, got {err:?}");
    };
    assert_eq!(report.operation, BlockedOperation::Delete);
    assert_eq!(report.count_for(EntityKind::Processor), 2);
    assert_eq!(err.to_string(), "Cannot delete Schema: found 2 Processor references");
    assert!(store.entities::<Schema>().exists_by_id(&ctx(), s1.header.id).await.unwrap());
}

#[tokio::test]
async fn step_with_missing_processor_is_rejected() {
    let (store, publisher) = memory_store();
    let missing = Uuid::new_v4();

    let err = store.entities::<Step>()
                   .create(&ctx(), Step::new("v1", "parse", missing))
                   .await
                   .unwrap_err();
    let MetaError::ForeignKeyValidation(violation) = &err else {
        panic!("expected ForeignKeyValidation, got {err:?}");
    };
    assert_eq!(violation.field, "ProcessorId");
    assert_eq!(violation.reason, ViolationReason::Missing);
    assert_eq!(err.to_string(),
               format!("ForeignKey validation failed: Step.ProcessorId references missing Processor '{missing}'"));
    assert_eq!(store.entities::<Step>().count(&ctx()).await.unwrap(), 0);
    assert!(publisher.events().await.is_empty());
}

#[tokio::test]
async fn empty_mandatory_reference_is_rejected() {
    let (store, _) = memory_store();
    let err = store.entities::<Step>()
                   .create(&ctx(), Step::new("v1", "parse", Uuid::nil()))
                   .await
                   .unwrap_err();
    let MetaError::ForeignKeyValidation(violation) = err else {
        panic!("expected ForeignKeyValidation");
    };
    assert_eq!(violation.reason, ViolationReason::Empty);
}

#[tokio::test]
async fn flow_is_deletable_once_its_orchestration_is_gone() {
    let (store, _) = memory_store();
    let s = schema(&store, "v1", "Sch").await;
    let p = processor(&store, "P1", s.header.id, s.header.id).await;
    let st1 = store.entities::<Step>()
                   .create(&ctx(), Step::new("v1", "St1", p.header.id))
                   .await
                   .unwrap();
    let f1 = store.entities::<Flow>()
                  .create(&ctx(), Flow::new("v1", "F1", vec![st1.header.id]))
                  .await
                  .unwrap();
    let of = store.entities::<OrchestratedFlow>()
                  .create(&ctx(), OrchestratedFlow::new("v1", "OF1", f1.header.id, vec![]))
                  .await
                  .unwrap();

    let err = store.entities::<Flow>().delete(&ctx(), f1.header.id).await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot delete Flow: found 1 OrchestratedFlow reference");
    assert_eq!(err.error_type(), "ReferentialIntegrity");

    assert!(store.entities::<OrchestratedFlow>().delete(&ctx(), of.header.id).await.unwrap());
    assert!(store.entities::<Flow>().delete(&ctx(), f1.header.id).await.unwrap());
}

#[tokio::test]
async fn list_reference_reports_failing_index() {
    let (store, _) = memory_store();
    let s = schema(&store, "v1", "Sch").await;
    let p = processor(&store, "P1", s.header.id, s.header.id).await;
    let st1 = store.entities::<Step>()
                   .create(&ctx(), Step::new("v1", "St1", p.header.id))
                   .await
                   .unwrap();
    let ghost = Uuid::new_v4();

    let err = store.entities::<Flow>()
                   .create(&ctx(), Flow::new("v1", "F1", vec![st1.header.id, ghost]))
                   .await
                   .unwrap_err();
    assert_eq!(err.to_string(),
               format!("ForeignKey validation failed: Flow.StepIds[1] references missing Step '{ghost}'"));

    // Una lista vacía no referencia nada y es válida.
    store.entities::<Flow>()
         .create(&ctx(), Flow::new("v1", "empty", vec![]))
         .await
         .unwrap();
}

#[tokio::test]
async fn step_referenced_by_several_flows_blocks_deletion() {
    let (store, _) = memory_store();
    let s = schema(&store, "v1", "Sch").await;
    let p = processor(&store, "P1", s.header.id, s.header.id).await;
    let st = store.entities::<Step>()
                  .create(&ctx(), Step::new("v1", "St", p.header.id))
                  .await
                  .unwrap();
    for name in ["F1", "F2", "F3"] {
        store.entities::<Flow>()
             .create(&ctx(), Flow::new("v1", name, vec![st.header.id]))
             .await
             .unwrap();
    }
    store.entities::<Assignment>()
         .create(&ctx(), Assignment::new(st.header.id, vec![EntityRef::new(EntityKind::Schema, s.header.id)]))
         .await
         .unwrap();

    let err = store.entities::<Step>().delete(&ctx(), st.header.id).await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot delete Step: found 3 Flow references, 1 Assignment reference");
}

#[tokio::test]
async fn tagged_assignment_references_dispatch_by_kind() {
    let (store, _) = memory_store();
    let s = schema(&store, "v1", "Sch").await;
    let p = processor(&store, "P1", s.header.id, s.header.id).await;
    let st = store.entities::<Step>()
                  .create(&ctx(), Step::new("v1", "St", p.header.id))
                  .await
                  .unwrap();
    let address = store.entities::<Address>()
                       .create(&ctx(), Address::new("v1", "inbox", "queue://inbox", s.header.id))
                       .await
                       .unwrap();
    let delivery = store.entities::<Delivery>()
                        .create(&ctx(), Delivery::new("v1", "sample", s.header.id))
                        .await
                        .unwrap();

    // El id de la dirección etiquetado como Delivery no existe en esa colección.
    let err = store.entities::<Assignment>()
                   .create(&ctx(), Assignment::new(st.header.id, vec![EntityRef::new(EntityKind::Delivery, address.header.id)]))
                   .await
                   .unwrap_err();
    assert_eq!(err.to_string(),
               format!("ForeignKey validation failed: Assignment.EntityIds[0] references missing Delivery '{}'",
                       address.header.id));

    let err = store.entities::<Assignment>()
                   .create(&ctx(), Assignment::new(st.header.id, vec![EntityRef::new(EntityKind::Processor, p.header.id)]))
                   .await
                   .unwrap_err();
    let MetaError::ForeignKeyValidation(violation) = err else {
        panic!("expected ForeignKeyValidation");
    };
    assert_eq!(violation.reason, ViolationReason::KindNotAllowed);

    let refs = vec![EntityRef::new(EntityKind::Address, address.header.id),
                    EntityRef::new(EntityKind::Delivery, delivery.header.id)];
    store.entities::<Assignment>()
         .create(&ctx(), Assignment::new(st.header.id, refs))
         .await
         .unwrap();

    let err = store.entities::<Address>().delete(&ctx(), address.header.id).await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot delete Address: found 1 Assignment reference");
    let err = store.entities::<Delivery>().delete(&ctx(), delivery.header.id).await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot delete Delivery: found 1 Assignment reference");

    // Schema: 1 Address + 1 Delivery + 2 Processor (entrada y salida).
    let report = store.validator()
                      .reference_report(EntityKind::Schema, s.header.id, BlockedOperation::Delete)
                      .await
                      .unwrap();
    assert_eq!(report.count_for(EntityKind::Address), 1);
    assert_eq!(report.count_for(EntityKind::Delivery), 1);
    assert_eq!(report.count_for(EntityKind::Processor), 2);
    assert_eq!(report.count_for(EntityKind::Assignment), 0);
}

#[tokio::test]
async fn key_change_is_blocked_while_referenced() {
    let (store, _) = memory_store();
    let s = schema(&store, "v1", "Sch").await;
    let p = processor(&store, "P1", s.header.id, s.header.id).await;
    store.entities::<Step>()
         .create(&ctx(), Step::new("v1", "St", p.header.id))
         .await
         .unwrap();

    let mut renamed = p.clone();
    renamed.name = "P1-renamed".into();
    let err = store.entities::<Processor>().update(&ctx(), renamed).await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot modify Processor: found 1 Step reference");

    // Mismo version+name: el update no toca la identidad y se acepta.
    let kept = p.clone().with_image("registry/parser:2");
    let updated = store.entities::<Processor>().update(&ctx(), kept).await.unwrap();
    assert_eq!(updated.image, "registry/parser:2");
}

#[tokio::test]
async fn update_revalidates_foreign_keys() {
    let (store, _) = memory_store();
    let s = schema(&store, "v1", "Sch").await;
    let p = processor(&store, "P1", s.header.id, s.header.id).await;

    let mut broken = p.clone();
    broken.output_schema_id = Uuid::new_v4();
    let err = store.entities::<Processor>().update(&ctx(), broken).await.unwrap_err();
    let MetaError::ForeignKeyValidation(violation) = err else {
        panic!("expected ForeignKeyValidation");
    };
    assert_eq!(violation.field, "OutputSchemaId");

    let stored = store.entities::<Processor>().get_by_id(&ctx(), p.header.id).await.unwrap();
    assert_eq!(stored.output_schema_id, s.header.id);
}

#[tokio::test]
async fn orchestrated_flow_is_a_sink() {
    let (store, _) = memory_store();
    let s = schema(&store, "v1", "Sch").await;
    let p = processor(&store, "P1", s.header.id, s.header.id).await;
    let st = store.entities::<Step>()
                  .create(&ctx(), Step::new("v1", "St", p.header.id))
                  .await
                  .unwrap();
    let f = store.entities::<Flow>()
                 .create(&ctx(), Flow::new("v1", "F", vec![st.header.id]))
                 .await
                 .unwrap();
    let a = store.entities::<Assignment>()
                 .create(&ctx(), Assignment::new(st.header.id, vec![]))
                 .await
                 .unwrap();
    let of = store.entities::<OrchestratedFlow>()
                  .create(&ctx(), OrchestratedFlow::new("v1", "OF", f.header.id, vec![a.header.id]))
                  .await
                  .unwrap();

    assert!(store.validator().catalog().is_sink(EntityKind::OrchestratedFlow));
    let err = store.entities::<Assignment>().delete(&ctx(), a.header.id).await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot delete Assignment: found 1 OrchestratedFlow reference");

    let mut renamed = of.clone();
    renamed.name = "OF-renamed".into();
    store.entities::<OrchestratedFlow>().update(&ctx(), renamed).await.unwrap();
    assert!(store.entities::<OrchestratedFlow>().delete(&ctx(), of.header.id).await.unwrap());
}

#[tokio::test]
async fn optional_field_accepts_the_empty_sentinel() {
    let catalog = ReferenceCatalog::new(vec![
        ReferenceField::single(EntityKind::Step, "processor_id", "ProcessorId", EntityKind::Processor).optional(),
    ]);
    let store = MetadataStore::with_catalog(InMemoryDocumentStore::new(), InMemoryEventPublisher::new(), catalog);

    store.entities::<Step>()
         .create(&ctx(), Step::new("v1", "draft", Uuid::nil()))
         .await
         .unwrap();
    let err = store.entities::<Step>()
                   .create(&ctx(), Step::new("v1", "dangling", Uuid::new_v4()))
                   .await
                   .unwrap_err();
    assert!(matches!(err, MetaError::ForeignKeyValidation(_)));
}

#[tokio::test]
async fn repointing_the_reference_releases_the_target() {
    let (store, _) = memory_store();
    let old = schema(&store, "v1", "old").await;
    let new = schema(&store, "v1", "new").await;
    let p = processor(&store, "P1", old.header.id, new.header.id).await;

    let err = store.entities::<Schema>().delete(&ctx(), old.header.id).await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot delete Schema: found 1 Processor reference");

    let mut repointed = p.clone();
    repointed.input_schema_id = new.header.id;
    store.entities::<Processor>().update(&ctx(), repointed).await.unwrap();

    assert!(store.entities::<Schema>().delete(&ctx(), old.header.id).await.unwrap());
    let err = store.entities::<Schema>().delete(&ctx(), new.header.id).await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot delete Schema: found 2 Processor references");
}
