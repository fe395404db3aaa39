mod common;

use std::sync::Arc;

use common::{ctx, memory_store, Fault, FaultyStore};
use flowmeta_core::domain::{EntityKind, Schema};
use flowmeta_core::{DocumentStore, InMemoryDocumentStore, InMemoryEventPublisher, MetaError, MetadataStore, NewDocument,
                    ReferenceCatalog, StoreError};
use serde_json::json;
use tokio::sync::Barrier;
use uuid::Uuid;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_with_same_key_admit_exactly_one() {
    for _ in 0..20 {
        let (store, publisher) = memory_store();
        let handles: Vec<_> = (0..8).map(|_| {
                                        let store = store.clone();
                                        tokio::spawn(async move {
                                            store.entities::<Schema>()
                                                 .create(&ctx(), Schema::new("v1", "race"))
                                                 .await
                                        })
                                    })
                                    .collect();

        let mut created = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(MetaError::DuplicateKey { kind: EntityKind::Schema, .. }) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(store.entities::<Schema>().count(&ctx()).await.unwrap(), 1);
        assert_eq!(publisher.events().await.len(), 1);
    }
}

#[tokio::test]
async fn backend_unique_index_is_the_final_authority() {
    // La precondición de lectura no ve la fila existente: sólo el índice
    // único del backend puede rechazar el segundo create.
    let publisher = Arc::new(InMemoryEventPublisher::new());
    let store = MetadataStore::from_shared(Arc::new(FaultyStore::new(Fault::BlindKeyLookup)),
                                           Arc::clone(&publisher),
                                           ReferenceCatalog::standard());
    store.entities::<Schema>()
         .create(&ctx(), Schema::new("v1", "race"))
         .await
         .unwrap();

    let err = store.entities::<Schema>()
                   .create(&ctx(), Schema::new("v1", "race"))
                   .await
                   .unwrap_err();
    assert_eq!(err.to_string(), "Schema with key 'v1:race' already exists");
    assert_eq!(publisher.events().await.len(), 1);
}

fn keyed(id: Uuid, key: &str) -> NewDocument {
    NewDocument { kind: EntityKind::Step,
                  id,
                  composite_key: key.to_string(),
                  body: json!({"key": key}) }
}

/// Lanza dos reemplazos de la misma fila a la vez y devuelve la fila final.
async fn race_replacements(store: &Arc<InMemoryDocumentStore>, id: Uuid, left: &str, right: &str) -> String {
    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [left.to_string(), right.to_string()].into_iter()
                                                               .map(|key| {
                                                                   let store = Arc::clone(store);
                                                                   let barrier = Arc::clone(&barrier);
                                                                   tokio::spawn(async move {
                                                                       barrier.wait().await;
                                                                       store.replace(keyed(id, &key)).await
                                                                   })
                                                               })
                                                               .collect();
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_some());
    }
    store.get_by_id(EntityKind::Step, id).await.unwrap().unwrap().composite_key
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_key_changes_leave_only_the_final_key_indexed() {
    for _ in 0..200 {
        let store = Arc::new(InMemoryDocumentStore::new());
        let id = Uuid::new_v4();
        store.insert(keyed(id, "A")).await.unwrap();

        let current = race_replacements(&store, id, "B", "C").await;
        assert!(current == "B" || current == "C");

        let found = store.get_by_key(EntityKind::Step, &current).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        for other in ["A", "B", "C"].into_iter().filter(|k| *k != current) {
            assert!(store.get_by_key(EntityKind::Step, other).await.unwrap().is_none(),
                    "key {other} still resolves after the row moved to {current}");
            store.insert(keyed(Uuid::new_v4(), other)).await.unwrap();
        }
        assert_eq!(store.count(EntityKind::Step).await.unwrap(), 3);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn key_change_racing_a_resubmit_keeps_the_key_unique() {
    for _ in 0..200 {
        let store = Arc::new(InMemoryDocumentStore::new());
        let id = Uuid::new_v4();
        store.insert(keyed(id, "A")).await.unwrap();

        let current = race_replacements(&store, id, "B", "A").await;
        let freed = if current == "A" { "B" } else { "A" };

        let err = store.insert(keyed(Uuid::new_v4(), &current)).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { kind: EntityKind::Step, .. }));
        assert!(store.get_by_key(EntityKind::Step, freed).await.unwrap().is_none());
        store.insert(keyed(Uuid::new_v4(), freed)).await.unwrap();
        assert_eq!(store.count(EntityKind::Step).await.unwrap(), 2);
    }
}
