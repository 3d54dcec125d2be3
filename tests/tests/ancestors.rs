mod common;
use anyhow::Result;
use common::*;
use kestrel::{Dataset, DatasetConfig, Direction, Entity, Key, Operator, KEY_PROPERTY};
use kestrel_storage_sled::SledTransport;
use std::sync::Arc;

#[tokio::test]
async fn ancestor_queries_stay_inside_the_group() -> Result<()> {
    let dataset = sled_dataset()?;
    let alice = Key::with_name("Owner", "alice");
    let bob = Key::with_name("Owner", "bob");

    let pets: Vec<Entity> = [(&alice, "Rex"), (&alice, "Tom"), (&bob, "Kit")]
        .iter()
        .map(|(owner, name)| Entity::new(owner.child("Pet", None)).with("name", *name))
        .collect();
    dataset.save(&pets).await?;
    assert!(pets[0].key().descends_from(&alice));

    let query = dataset.query("Pet").ancestor(alice.clone()).order("name", Direction::Descending);
    assert_eq!(names(&dataset.run(&query).await?), vec!["Tom", "Rex"]);

    let query = dataset.query("Pet").filter(KEY_PROPERTY, Operator::Equal, pets[2].key());
    assert_eq!(names(&dataset.run(&query).await?), vec!["Kit"]);
    Ok(())
}

#[tokio::test]
async fn namespaces_partition_the_same_store() -> Result<()> {
    let transport = Arc::new(SledTransport::new_test()?);
    let tenant_a = Dataset::with_config(transport.clone(), DatasetConfig::default().with_namespace("a"));
    let tenant_b = Dataset::with_config(transport.clone(), DatasetConfig::default().with_namespace("b"));

    tenant_a.save(&[tenant_a.entity("Pet").with("name", "Rex")]).await?;
    tenant_b.save(&[tenant_b.entity("Pet").with("name", "Kit")]).await?;
    tenant_b.save(&[Entity::new(tenant_b.key("Pet", "fixed")).with("name", "Ace")]).await?;

    assert_eq!(names(&tenant_a.run(&tenant_a.query("Pet")).await?), vec!["Rex"]);
    assert_eq!(sort_names(&tenant_b.run(&tenant_b.query("Pet")).await?), vec!["Ace", "Kit"]);
    assert!(tenant_a.find(tenant_a.key("Pet", "fixed")).await?.is_none());
    assert!(tenant_b.find(tenant_b.key("Pet", "fixed")).await?.is_some());
    Ok(())
}
