//! Read-through response cache keyed by URL.
//!
//! Entries are write-once: the first successful download for a URL is kept
//! for the rest of the session. There is no TTL and no eviction; the only way
//! to drop an entry is an explicit [`ResponseCache::invalidate`] or
//! [`ResponseCache::clear`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::fetch::FetchedResource;

#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, Arc<FetchedResource>>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock only means another thread panicked mid-insert; the map
    // itself is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<FetchedResource>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, url: &str) -> Option<Arc<FetchedResource>> {
        self.lock().get(url).cloned()
    }

    /// Store a resource unless the URL is already cached. Returns the entry
    /// that ends up in the cache.
    pub fn insert(&self, resource: FetchedResource) -> Arc<FetchedResource> {
        let mut entries = self.lock();
        entries
            .entry(resource.url.clone())
            .or_insert_with(|| Arc::new(resource))
            .clone()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains_key(url)
    }

    /// Drop one URL. Returns whether an entry was present.
    pub fn invalidate(&self, url: &str) -> bool {
        self.lock().remove(url).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
