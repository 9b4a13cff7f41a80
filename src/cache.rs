//! Recency Cache Module
//!
//! Bounded key → value memoization layer in front of the log.
//!
//! ## Responsibilities
//! - Serve repeated GETs without touching disk
//! - Evict the least-recently-used entry on overflow
//!
//! The cache never reads the log and never checks expiry; the engine
//! invalidates entries when keys are deleted or found expired.

use std::num::NonZeroUsize;

use lru::LruCache;
use serde_json::Value;

/// Bounded mapping from key to the most-recently-read value.
///
/// Both insert and lookup count as use for eviction ordering.
pub struct RecencyCache {
    entries: LruCache<String, Value>,
}

impl RecencyCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        RecencyCache {
            entries: LruCache::new(capacity),
        }
    }

    /// Look up a key, marking it most-recently-used on a hit.
    pub fn lookup(&mut self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    /// Insert or refresh a key, marking it most-recently-used.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.entries.put(key.into(), value);
    }

    /// Drop a key if present.
    pub fn invalidate(&mut self, key: &str) {
        self.entries.pop(key);
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}
