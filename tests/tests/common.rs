use std::sync::Arc;

use kestrel::{Dataset, DatasetConfig, Entity, Key};
use kestrel_storage_sled::SledTransport;
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() { tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init(); }

#[allow(unused)]
pub fn sled_dataset() -> anyhow::Result<Dataset> {
    Ok(Dataset::with_config(Arc::new(SledTransport::new_test()?), DatasetConfig::default().with_dataset_id("e2e")))
}

#[allow(unused)]
pub fn pet(name: &str, age: i64) -> Entity { Entity::new(Key::incomplete("Pet")).with("name", name).with("age", age) }

#[allow(unused)]
pub fn names(entities: &[Entity]) -> Vec<String> {
    entities.iter().map(|e| e.get("name").and_then(|v| v.as_str().map(str::to_owned)).unwrap_or_default()).collect()
}

#[allow(unused)]
pub fn sort_names(entities: &[Entity]) -> Vec<String> {
    let mut names = names(entities);
    names.sort();
    names
}
