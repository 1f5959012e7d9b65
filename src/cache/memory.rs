//! In-process manifest cache

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{expires_at, is_fresh, Clock, ManifestCache, SystemClock};
use crate::error::CacheError;
use crate::manifest::Manifest;

#[derive(Debug, Clone)]
struct Entry {
    manifest: Manifest,
    expires_at: DateTime<Utc>,
}

/// Thread-safe in-memory cache
///
/// Suitable for a single process serving many template renders. Expired
/// entries are dropped when they are next read, and all expired entries are
/// pruned on every write.
#[derive(Debug)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a cache that reads time from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored entries, including expired ones not yet pruned
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn remove(&self, key: &str) -> Option<Manifest> {
        self.entries().remove(key).map(|entry| entry.manifest)
    }

    pub fn clear(&self) {
        self.entries().clear();
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Manifest> {
        let now = self.clock.now();
        let mut entries = self.entries();

        match entries.get(key) {
            Some(entry) if is_fresh(now, entry.expires_at) => Some(entry.manifest.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, manifest: &Manifest, ttl: Duration) -> Result<(), CacheError> {
        let now = self.clock.now();
        let entry = Entry {
            manifest: manifest.clone(),
            expires_at: expires_at(now, ttl),
        };
        let mut entries = self.entries();
        entries.retain(|_, entry| is_fresh(now, entry.expires_at));
        entries.insert(key.to_string(), entry);
        Ok(())
    }
}
