//! Cache front end and the in-process backend.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Serialize};

use crate::CacheError;

/// Storage behind a [`Cache`]. Values are opaque serialized bytes.
pub trait CacheBackend: Send + Sync {
    /// Get a value, `None` when missing or expired.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store a value with an optional time-to-live.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Delete a value.
    fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Delete every key starting with `prefix`, returning how many were removed.
    fn remove_by_prefix(&self, prefix: &str) -> Result<usize, CacheError>;

    /// Delete everything.
    fn clear(&self) -> Result<(), CacheError>;
}

struct Entry {
    bytes: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Process-local backend over a locked hash map.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .map(|entries| entries.values().filter(|e| !e.is_expired(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> CacheError {
    CacheError::LockPoisoned(e.to_string())
}

impl CacheBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.bytes.clone()))
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(
            key.to_string(),
            Entry {
                bytes: value,
                expires_at,
            },
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().map_err(poisoned)?.remove(key);
        Ok(())
    }

    fn remove_by_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok(before - entries.len())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.entries.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

/// Type-safe cache with automatic JSON serialization.
///
/// Cloning is cheap; clones share the same backend.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
}

impl Cache {
    /// Create a cache over the given backend.
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Create a cache over a fresh [`MemoryBackend`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.backend.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Set a value in the cache. `None` means no expiry.
    pub fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.backend.set(key, bytes, ttl)
    }

    /// Return the cached value, or compute, store and return it.
    ///
    /// Errors from `load` are returned unchanged and nothing is stored.
    pub fn get_or_insert_with<T, E, F>(&self, key: &str, ttl: Option<Duration>, load: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.get::<T>(key)? {
            tracing::trace!(key, "cache hit");
            return Ok(value);
        }
        tracing::debug!(key, "cache miss");
        let value = load()?;
        self.set(key, &value, ttl)?;
        Ok(value)
    }

    /// Delete a value from the cache.
    pub fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.backend.remove(key)
    }

    /// Check if a key exists in the cache.
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.backend.get(key)?.is_some())
    }

    /// Delete all keys under a namespace prefix.
    pub fn remove_by_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let removed = self.backend.remove_by_prefix(prefix)?;
        tracing::debug!(prefix, removed, "cache invalidated");
        Ok(removed)
    }

    /// Delete everything.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.backend.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Node {
        id: u32,
        name: String,
    }

    #[test]
    fn test_set_and_get() {
        let cache = Cache::in_memory();
        let node = Node {
            id: 1,
            name: "Books".into(),
        };
        cache.set("node:1", &node, None).unwrap();
        assert_eq!(cache.get::<Node>("node:1").unwrap(), Some(node));
        assert_eq!(cache.get::<Node>("node:2").unwrap(), None);
    }

    #[test]
    fn test_expired_entries_are_missing() {
        let cache = Cache::in_memory();
        cache.set("k", &1u32, Some(Duration::from_millis(0))).unwrap();
        assert_eq!(cache.get::<u32>("k").unwrap(), None);
        assert!(!cache.exists("k").unwrap());
    }

    #[test]
    fn test_get_or_insert_with_loads_once() {
        let cache = Cache::in_memory();
        let mut calls = 0;
        let first: Result<u32, CacheError> = cache.get_or_insert_with("k", None, || {
            calls += 1;
            Ok(7)
        });
        assert_eq!(first.unwrap(), 7);

        let second: Result<u32, CacheError> =
            cache.get_or_insert_with("k", None, || panic!("should be cached"));
        assert_eq!(second.unwrap(), 7);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_load_error_is_not_cached() {
        #[derive(Debug)]
        enum LoadError {
            Cache,
            Failed,
        }
        impl From<CacheError> for LoadError {
            fn from(_: CacheError) -> Self {
                LoadError::Cache
            }
        }

        let cache = Cache::in_memory();
        let result: Result<u32, LoadError> =
            cache.get_or_insert_with("k", None, || Err(LoadError::Failed));
        assert!(matches!(result, Err(LoadError::Failed)));
        assert!(!cache.exists("k").unwrap());
    }

    #[test]
    fn test_remove_by_prefix() {
        let cache = Cache::in_memory();
        cache.set("catalog.nav:1", &1u32, None).unwrap();
        cache.set("catalog.nav:2", &2u32, None).unwrap();
        cache.set("forum.groups", &3u32, None).unwrap();

        assert_eq!(cache.remove_by_prefix("catalog.").unwrap(), 2);
        assert!(cache.exists("forum.groups").unwrap());
        assert!(!cache.exists("catalog.nav:1").unwrap());
    }

    #[test]
    fn test_cache_key_macro() {
        let key = crate::cache_key!("shop.product.specs", 12, "en");
        assert_eq!(key, "shop.product.specs:12:en");
    }
}
