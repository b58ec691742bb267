//! Client-side cache of fetched preference documents.
//!
//! Shared by every view opened through one `PreferenceSync`. A successful
//! write invalidates the entry of its resource so the next read goes back to
//! the backend.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use gridview_model::GridPreference;
use tracing::trace;

/// Cache key of the grid preference of `resource`.
pub fn cache_key(resource: &str) -> String {
    format!("grid:{resource}")
}

/// Cached entry. `None` records that the backend had no document.
pub type CachedDocument = Option<GridPreference>;

#[derive(Debug, Default)]
pub struct PreferenceCache {
    entries: Mutex<HashMap<String, CachedDocument>>,
}

impl PreferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached document for `key`; the outer `None` is a cache miss.
    pub fn get(&self, key: &str) -> Option<CachedDocument> {
        self.lock().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, document: CachedDocument) {
        self.lock().insert(key.into(), document);
    }

    /// Drop the entry for `key`. Returns whether one was present.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.lock().remove(key).is_some();
        if removed {
            trace!(key, "preference cache entry invalidated");
        }
        removed
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CachedDocument>> {
        // Entries are plain data; a panic elsewhere cannot leave them torn.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
