mod common;
use common::*;
use kestrel_core::{
    error::{MutationError, RetrievalError, TransportError},
    AutoIdTracker, Dataset, DatasetConfig, Entity, Key, MutationBatch, Transport, Value,
};
use kestrel_storage_sled::{SledTransport, MAX_LOOKUP_KEYS};
use std::sync::Arc;

#[tokio::test]
async fn test_generated_ids_are_unique_and_stored() -> Result<(), anyhow::Error> {
    let (dataset, transport) = setup()?;

    let first = album("Kind of Blue", 1959);
    let second = album("A Love Supreme", 1965);
    dataset.save(&[first.clone(), second.clone()]).await?;
    assert!(first.is_persisted() && second.is_persisted());
    assert_ne!(first.key(), second.key());
    assert!(first.key().id().unwrap() > 0);
    assert_eq!(transport.database.len(), 2);

    let found = dataset.find(second.key()).await?.expect("saved album");
    assert_eq!(found.get("name"), Some(Value::from("A Love Supreme")));
    assert_eq!(found.get("year"), Some(Value::Integer(1965)));
    Ok(())
}

#[tokio::test]
async fn test_values_and_index_flags_survive_storage() -> Result<(), anyhow::Error> {
    let (dataset, _transport) = setup()?;
    let owner = Key::with_name("User", "ada");
    let entity = Entity::new(owner.child("Note", None))
        .with("body", "a".repeat(64))
        .with("tags", vec![Value::from("x"), Value::from(3i64)])
        .with("ratio", 0.5)
        .with("owner", owner.clone())
        .with("attachment", vec![0u8, 1, 2])
        .with("archived", Value::Null);
    entity.exclude_from_indexes("body");
    dataset.save(&[entity.clone()]).await?;

    let found = dataset.find(entity.key()).await?.expect("saved note");
    assert_eq!(found.properties(), entity.properties());
    assert!(found.is_excluded_from_indexes("body"));
    assert!(!found.is_excluded_from_indexes("tags"));
    assert_eq!(found.key().parent(), Some(&owner));
    Ok(())
}

#[tokio::test]
async fn test_upsert_replaces_and_delete_removes() -> Result<(), anyhow::Error> {
    let (dataset, transport) = setup()?;
    let key = Key::with_name("Album", "blue");

    dataset.save(&[Entity::new(key.clone()).with("name", "Blue").with("year", 1971)]).await?;
    dataset.save(&[Entity::new(key.clone()).with("name", "Blue (remaster)")]).await?;
    let found = dataset.find(key.clone()).await?.unwrap();
    assert_eq!(names(&[found.clone()]), vec!["Blue (remaster)"]);
    assert!(found.get("year").is_none());

    dataset.delete([key.clone()]).await?;
    assert!(dataset.find(key).await?.is_none());
    assert!(transport.database.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_large_lookups_are_deferred_and_completed() -> Result<(), anyhow::Error> {
    let transport = Arc::new(SledTransport::new_test()?);
    let dataset = Dataset::with_config(transport.clone(), DatasetConfig::default());
    let albums: Vec<Entity> = (0..MAX_LOOKUP_KEYS as i64 + 50).map(|i| album(&format!("Album {i}"), i)).collect();
    dataset.save(&albums).await?;
    let keys: Vec<Key> = albums.iter().map(Entity::key).collect();

    let response = transport.lookup(&keys, None).await?;
    assert_eq!(response.found.len(), MAX_LOOKUP_KEYS);
    assert_eq!(response.deferred.len(), 50);

    let results = dataset.find_all(keys).await?;
    assert_eq!(results.len(), MAX_LOOKUP_KEYS + 50);
    Ok(())
}

#[tokio::test]
async fn test_transaction_commit_is_atomic_and_closes_it() -> Result<(), anyhow::Error> {
    let (dataset, transport) = setup()?;
    let stale = Key::with_name("Album", "stale");
    dataset.save(&[Entity::new(stale.clone()).with("name", "Stale")]).await?;

    let created = album("Fresh", 2024);
    let probe = transport.clone();
    dataset
        .transaction(|trx| {
            let (created, stale) = (created.clone(), stale.clone());
            async move {
                trx.save(&[created])?;
                trx.delete([stale])?;
                assert_eq!(probe.open_transaction_count(), 1);
                Ok::<_, MutationError>(())
            }
        })
        .await?;

    assert_eq!(transport.open_transaction_count(), 0);
    assert!(dataset.find(stale).await?.is_none());
    assert!(dataset.find(created.key()).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_rolled_back_transaction_writes_nothing() -> Result<(), anyhow::Error> {
    let (dataset, transport) = setup()?;

    let trx = dataset.begin_transaction().await?;
    let draft = album("Draft", 2020);
    trx.save(&[draft.clone()])?;
    trx.rollback().await?;

    assert!(!draft.is_persisted());
    assert!(transport.database.is_empty());
    assert_eq!(transport.open_transaction_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_unknown_transactions_are_refused() -> Result<(), anyhow::Error> {
    let (dataset, transport) = setup()?;
    let trx = dataset.begin_transaction().await?;
    let id = trx.id().clone();
    trx.commit().await?;

    let err = transport.commit(Some(&id), &MutationBatch::new()).await.unwrap_err();
    assert!(matches!(err, TransportError::TransactionNotFound(_)));
    assert!(matches!(transport.rollback(&id).await, Err(TransportError::TransactionNotFound(_))));
    assert!(matches!(transport.lookup(&[Key::with_id("Album", 1)], Some(&id)).await, Err(TransportError::TransactionNotFound(_))));

    // reads through a finished transaction never reach the transport
    assert!(matches!(trx.find(Key::with_id("Album", 1)).await, Err(RetrievalError::Usage(_))));
    Ok(())
}

#[tokio::test]
async fn test_allocated_ids_do_not_collide_with_generated_ones() -> Result<(), anyhow::Error> {
    let (dataset, _transport) = setup()?;

    let allocated = dataset.allocate_ids(&Key::incomplete("Album"), 3).await?;
    let saved = album("After", 2000);
    dataset.save(&[saved.clone()]).await?;

    assert_eq!(allocated.len(), 3);
    assert!(!allocated.contains(&saved.key()));
    assert!(allocated.iter().all(|key| key.kind() == "Album" && key.is_complete()));
    Ok(())
}

#[tokio::test]
async fn test_abandoned_commit_still_closes_its_transaction() -> Result<(), anyhow::Error> {
    let (dataset, transport) = setup()?;
    let trx = dataset.begin_transaction().await?;
    let mut batch = MutationBatch::new();
    batch.save([Entity::new(Key::with_name("Album", "kept")).with("name", "Kept")], &mut AutoIdTracker::new());

    // stop waiting on the commit after its first poll
    tokio::select! {
        biased;
        _ = transport.commit(Some(trx.id()), &batch) => {}
        _ = std::future::ready(()) => {}
    }

    for _ in 0..200 {
        if transport.open_transaction_count() == 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(transport.open_transaction_count(), 0);
    assert_eq!(transport.database.len(), 1);
    Ok(())
}
