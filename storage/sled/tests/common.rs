use std::str::FromStr;
use std::sync::Arc;

use kestrel_core::{Dataset, DatasetConfig, Entity};
use kestrel_storage_sled::SledTransport;
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // if LOG_LEVEL env var is set, use it
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        tracing_subscriber::fmt().with_max_level(Level::from_str(&level).unwrap()).with_test_writer().init();
    } else {
        tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init();
    }
}

#[allow(unused)]
pub fn setup() -> anyhow::Result<(Dataset, Arc<SledTransport>)> {
    let transport = Arc::new(SledTransport::new_test()?);
    let dataset = Dataset::with_config(transport.clone(), DatasetConfig::default().with_dataset_id("sled-test"));
    Ok((dataset, transport))
}

#[allow(unused)]
pub fn names(entities: &[Entity]) -> Vec<String> {
    entities.iter().map(|e| e.get("name").and_then(|v| v.as_str().map(str::to_owned)).unwrap_or_default()).collect()
}

#[allow(unused)]
pub fn album(name: &str, year: i64) -> Entity { Entity::new(kestrel_core::Key::incomplete("Album")).with("name", name).with("year", year) }
