use std::path::Path;

use anyhow::{Context, Result};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode, Slice};
use tracing::debug;

use super::KvStore;

/// A durable [KvStore] backed by one fjall partition.
///
/// Every write is synced to disk before returning. Keys enumerate in
/// lexicographic byte order.
///
/// `key_at` walks the partition from the start, so enumerating every key by
/// index costs O(n²) reads; prefer `keys` for full scans.
#[derive(Clone)]
pub struct FjallStore {
    keyspace: Keyspace,
    subjects: PartitionHandle,
}

impl FjallStore {
    pub fn new(keyspace: Keyspace, partition: &str) -> Result<FjallStore> {
        let subjects = keyspace.open_partition(partition, PartitionCreateOptions::default())?;
        Ok(FjallStore { keyspace, subjects })
    }

    /// Opens (or creates) the keyspace at `path`.
    pub fn open(path: impl AsRef<Path>, partition: &str, temporary: bool) -> Result<FjallStore> {
        let path = path.as_ref();
        let keyspace = Config::new(path)
            .temporary(temporary)
            .open()
            .with_context(|| format!("unable to open keyspace at {}", path.display()))?;
        debug!(target: "backend", path = %path.display(), partition, "opened keyspace");
        FjallStore::new(keyspace, partition)
    }

    fn sync(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("unable to persist keyspace")
    }
}

fn utf8(bytes: Slice) -> Result<String> {
    Ok(std::str::from_utf8(&bytes)
        .context("stored bytes should be valid UTF-8")?
        .to_owned())
}

impl KvStore for FjallStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.subjects.get(key)? {
            Some(bytes) => Ok(Some(utf8(bytes)?)),
            None => Ok(None),
        }
    }
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.subjects.insert(key, value)?;
        self.sync()
    }
    fn remove(&self, key: &str) -> Result<()> {
        self.subjects.remove(key)?;
        self.sync()
    }
    fn clear(&self) -> Result<()> {
        let mut batch = self
            .keyspace
            .batch()
            .durability(Some(PersistMode::SyncAll));
        for key in self.subjects.keys() {
            batch.remove(&self.subjects, key?);
        }
        batch.commit()?;
        Ok(())
    }
    fn len(&self) -> Result<usize> {
        self.subjects
            .len()
            .context("unable to count subjects partition")
    }
    fn key_at(&self, index: usize) -> Result<Option<String>> {
        match self.subjects.keys().nth(index) {
            Some(key) => Ok(Some(utf8(key?)?)),
            None => Ok(None),
        }
    }
    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = vec![];
        for key in self.subjects.keys() {
            keys.push(utf8(key?)?);
        }
        Ok(keys)
    }
}
