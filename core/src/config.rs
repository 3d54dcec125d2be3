pub const DATASET_ENV: &str = "DATASTORE_DATASET";
pub const NAMESPACE_ENV: &str = "DATASTORE_NAMESPACE";

pub const DEFAULT_DATASET_ID: &str = "kestrel-local";
pub const DEFAULT_MAX_LOOKUP_BATCH: usize = 1000;

/// Settings for a [`Dataset`](crate::Dataset)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetConfig {
    pub dataset_id: String,
    /// Namespace given to keys and queries built through the dataset
    pub namespace: Option<String>,
    /// Upper bound on keys sent in one lookup request
    pub max_lookup_batch: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self { Self { dataset_id: DEFAULT_DATASET_ID.to_owned(), namespace: None, max_lookup_batch: DEFAULT_MAX_LOOKUP_BATCH } }
}

impl DatasetConfig {
    /// Defaults, overridden by `DATASTORE_DATASET` and `DATASTORE_NAMESPACE` when set and non-empty
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dataset_id) = std::env::var(DATASET_ENV).ok().filter(|v| !v.is_empty()) {
            config.dataset_id = dataset_id;
        }
        config.namespace = std::env::var(NAMESPACE_ENV).ok().filter(|v| !v.is_empty());
        config
    }

    pub fn with_dataset_id(mut self, dataset_id: impl Into<String>) -> Self {
        self.dataset_id = dataset_id.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Clamped to at least one key per request
    pub fn with_max_lookup_batch(mut self, max: usize) -> Self {
        self.max_lookup_batch = max.max(1);
        self
    }
}
