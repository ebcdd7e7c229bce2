use super::Store;
use crate::error::{other_error, DaybookResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything was saved under `key`
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }
}

impl Store for MemoryStore {
    fn load(&self, key: &str) -> DaybookResult<Option<Vec<u8>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| other_error("Memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &[u8]) -> DaybookResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| other_error("Memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
