use serde::Deserialize;

use crate::task::Task;

pub const DEFAULT_STORAGE_KEY: &str = "tasks";

/// Settings for opening a [`TaskStore`](crate::store::TaskStore).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Name of the persisted slot holding the serialized collection.
    pub storage_key: String,
    /// Collection used when the slot is absent, empty, or holds nothing valid.
    pub seed: Vec<Task>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            seed: Vec::new(),
        }
    }
}

impl StoreConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_seed(mut self, seed: Vec<Task>) -> Self {
        self.seed = seed;
        self
    }
}
