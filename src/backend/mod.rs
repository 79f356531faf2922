mod fjall_store;
mod memory_store;

use anyhow::Result;

pub use fjall_store::FjallStore;
pub use memory_store::MemoryStore;

/// A [KvStore] is a synchronous, string keyed and string valued storage
/// facility that subject records are persisted into.
///
/// Implementations report their own failures through [anyhow::Error]; the
/// engine passes them on without retrying.
pub trait KvStore {
    /// Retrieve the value (if any) stored against the given key
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Store the given value against the given key
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Delete the key; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
    /// Delete every key
    fn clear(&self) -> Result<()>;
    /// Number of keys currently stored
    fn len(&self) -> Result<usize>;
    /// The key at the given position in enumeration order
    fn key_at(&self, index: usize) -> Result<Option<String>>;
    /// Every key, in enumeration order
    fn keys(&self) -> Result<Vec<String>>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl<S> KvStore for &S
where
    S: KvStore + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
    fn len(&self) -> Result<usize> {
        (**self).len()
    }
    fn key_at(&self, index: usize) -> Result<Option<String>> {
        (**self).key_at(index)
    }
    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}
