use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Hex encoded SHA-256 of `bytes`.
pub fn content_id(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Outputs already computed during this session, keyed by the hash of their input.
#[derive(Debug)]
pub struct ContentCache<V> {
    entries: HashMap<String, V>,
    hits: usize,
}

impl<V> Default for ContentCache<V> {
    fn default() -> Self {
        ContentCache {
            entries: HashMap::new(),
            hits: 0,
        }
    }
}

impl<V: Clone> ContentCache<V> {
    /// Returns the cached value of `bytes`, or computes and stores it. Failures are not cached.
    pub fn get_or_try_insert_with<E, F>(&mut self, bytes: &[u8], compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let id = content_id(bytes);
        if let Some(value) = self.entries.get(&id) {
            self.hits += 1;
            return Ok(value.clone());
        }
        let value = compute()?;
        self.entries.insert(id, value.clone());
        Ok(value)
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
