use std::sync::Arc;

use anyhow::Result;
use indexmap::IndexMap;
use parking_lot::RwLock;

use super::KvStore;

/// A [KvStore] kept in memory and never persisted.
///
/// Clones share the same entries. Keys enumerate in insertion order.
#[derive(Clone, Default, Debug)]
pub struct MemoryStore {
    entries: Arc<RwLock<IndexMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().shift_remove(key);
        Ok(())
    }
    fn clear(&self) -> Result<()> {
        self.entries.write().clear();
        Ok(())
    }
    fn len(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }
    fn key_at(&self, index: usize) -> Result<Option<String>> {
        Ok(self
            .entries
            .read()
            .get_index(index)
            .map(|(key, _)| key.clone()))
    }
    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}
