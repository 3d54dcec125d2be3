mod common;
use anyhow::Result;
use common::*;
use kestrel::{
    error::{MutationError, RetrievalError},
    Direction, Entity, Key, Operator,
};

#[derive(Debug, thiserror::Error)]
enum BlockError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    #[error(transparent)]
    Mutation(#[from] MutationError),
    #[error("pet {0} not found")]
    NotFound(Key),
}

#[tokio::test]
async fn basic_inserted_and_retrieved() -> Result<()> {
    let dataset = sled_dataset()?;

    let rex = pet("Rex", 3);
    let tom = pet("Tom", 7);
    let saved = dataset.save(&[rex.clone(), tom.clone()]).await?;
    assert!(saved.iter().all(Entity::is_persisted));

    let found = dataset.find(rex.key()).await?.expect("rex was saved");
    assert_eq!(names(&[found]), vec!["Rex"]);

    let results = dataset.find_all([rex.key(), tom.key(), Key::with_id("Pet", 9999)]).await?;
    assert_eq!(sort_names(&results), vec!["Rex", "Tom"]);
    assert_eq!(results.missing, vec![Key::with_id("Pet", 9999)]);
    Ok(())
}

#[tokio::test]
async fn basic_where_clause() -> Result<()> {
    let dataset = sled_dataset()?;
    dataset.save(&[pet("Rex", 3), pet("Tom", 7), pet("Kit", 1), pet("Ace", 12)]).await?;

    let query = dataset.query("Pet").filter("age", Operator::GreaterThan, 2).order("age", Direction::Ascending);
    assert_eq!(names(&dataset.run(&query).await?), vec!["Rex", "Tom", "Ace"]);

    let query = dataset.query("Pet").filter("name", Operator::Equal, "Kit");
    assert_eq!(names(&dataset.run(&query).await?), vec!["Kit"]);

    // comparisons never cross types
    let query = dataset.query("Pet").filter("age", Operator::GreaterThan, "2");
    assert!(dataset.run(&query).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn basic_update_in_transaction() -> Result<()> {
    let dataset = sled_dataset()?;
    let rex = pet("Rex", 3);
    dataset.save(&[rex.clone()]).await?;

    let key = rex.key();
    dataset
        .transaction(|trx| async move {
            let rex = trx.find(key.clone()).await?.ok_or(BlockError::NotFound(key))?;
            let age = rex.get("age").and_then(|v| v.as_i64()).unwrap_or_default();
            rex.set("age", age + 1);
            trx.save(&[rex])?;
            Ok::<_, BlockError>(())
        })
        .await?;

    let rex = dataset.find(rex.key()).await?.unwrap();
    assert_eq!(rex.get("age").and_then(|v| v.as_i64()), Some(4));
    Ok(())
}

#[tokio::test]
async fn basic_failed_block_leaves_nothing_behind() -> Result<()> {
    let dataset = sled_dataset()?;
    let ghost = pet("Ghost", 0);

    let err = dataset
        .transaction(|trx| {
            let ghost = ghost.clone();
            async move {
                trx.save(&[ghost])?;
                Err::<(), _>(MutationError::from(kestrel::error::TransportError::Rejected("validation failed".into())))
            }
        })
        .await
        .unwrap_err();

    assert!(err.to_string().contains("validation failed"));
    assert!(!ghost.is_persisted());
    assert!(dataset.run(&dataset.query("Pet")).await?.is_empty());
    Ok(())
}
