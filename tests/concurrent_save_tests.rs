use docsave::{Entity, MemoryStore, MemoryStoreConfig, SaveError, StoreError, save_struct};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Serialize, Entity)]
struct Reading {
    id: i64,
    sensor: String,
    value: f64,
}

fn readings(count: usize) -> Vec<Reading> {
    (0..count)
        .map(|i| Reading {
            id: 0,
            sensor: format!("s-{}", i % 3),
            value: i as f64 * 0.5,
        })
        .collect()
}

#[tokio::test]
async fn test_concurrent_saves_get_distinct_ids() {
    let store = MemoryStore::new();
    let mut batch = readings(32);

    let keys = join_all(batch.iter_mut().map(|reading| save_struct(&store, reading))).await;

    let ids: BTreeSet<i64> = keys.into_iter().map(|key| key.unwrap().id()).collect();
    assert_eq!(ids.len(), 32);
    assert_eq!(ids.iter().next(), Some(&1));
    assert_eq!(store.len().await, 32);

    let assigned: BTreeSet<i64> = batch.iter().map(|reading| reading.id).collect();
    assert_eq!(assigned, ids);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_saves_from_spawned_tasks() {
    let store = Arc::new(MemoryStore::new());

    let handles: Vec<_> = readings(16)
        .into_iter()
        .map(|mut reading| {
            let store = store.clone();
            tokio::spawn(async move {
                save_struct(store.as_ref(), &mut reading).await?;
                Ok::<_, SaveError>(reading.id)
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap());
    }
    ids.sort();

    assert_eq!(ids, (1..=16).collect::<Vec<_>>());
    assert_eq!(store.write_count(), 16);
}

#[tokio::test]
async fn test_capacity_errors_surface_per_save() {
    let store = MemoryStore::with_config(MemoryStoreConfig::new().max_documents(2)).unwrap();
    let mut batch = readings(3);

    let results = join_all(batch.iter_mut().map(|reading| save_struct(&store, reading))).await;

    let failures: Vec<_> = results.iter().filter(|result| result.is_err()).collect();
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0],
        Err(SaveError::Store(StoreError::CapacityExceeded(2)))
    ));
    assert_eq!(batch.iter().filter(|reading| reading.id == 0).count(), 1);
}
