mod common;
use anyhow::Result;
use common::*;
use kestrel::{error::MutationError, Entity};
use std::collections::HashSet;

#[tokio::test]
async fn concurrent_transactions_get_distinct_ids() -> Result<()> {
    let dataset = sled_dataset()?;

    let mut handles = Vec::new();
    for worker in 0..8 {
        let dataset = dataset.clone();
        handles.push(tokio::spawn(async move {
            let pets: Vec<Entity> = (0..5).map(|i| pet(&format!("w{worker}-p{i}"), i)).collect();
            let staged = pets.clone();
            dataset
                .transaction(|trx| async move {
                    trx.save(&staged)?;
                    Ok::<_, MutationError>(())
                })
                .await?;
            Ok::<_, anyhow::Error>(pets)
        }));
    }

    let mut keys = HashSet::new();
    for handle in handles {
        for pet in handle.await?? {
            assert!(pet.is_persisted());
            assert!(keys.insert(pet.key()), "duplicate key {}", pet.key());
        }
    }
    assert_eq!(keys.len(), 40);
    assert_eq!(dataset.run(&dataset.query("Pet")).await?.len(), 40);
    Ok(())
}

#[tokio::test]
async fn interleaved_manual_transactions() -> Result<()> {
    let dataset = sled_dataset()?;

    let keep = dataset.begin_transaction().await?;
    let discard = dataset.begin_transaction().await?;
    assert_ne!(keep.id(), discard.id());

    keep.save(&[pet("Kept", 1)])?;
    discard.save(&[pet("Discarded", 2)])?;
    discard.rollback().await?;
    keep.commit().await?;

    assert_eq!(names(&dataset.run(&dataset.query("Pet")).await?), vec!["Kept"]);
    Ok(())
}
