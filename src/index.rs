//! Index Module
//!
//! In-memory mapping from each live key to the position of its most
//! recent PUT record. Rebuilt from the log on open and after compaction.

use std::collections::HashMap;

/// Where a key's most recent PUT payload lives, plus its expiry.
///
/// Storing the payload length alongside the offset means GET needs no
/// backward scan and no second header read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Absolute offset of the first payload byte
    pub offset: u64,

    /// Payload length in bytes, excluding the trailing newline
    pub len: u32,

    /// 0 for no expiry, otherwise absolute Unix seconds
    pub expiry: u64,
}

/// Mapping from key to its latest record position.
#[derive(Debug, Default)]
pub struct Index {
    entries: HashMap<String, IndexEntry>,
}

impl Index {
    pub fn new() -> Self {
        Index::default()
    }

    pub fn get(&self, key: &str) -> Option<&IndexEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: IndexEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Remove a key, reporting whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Unordered snapshot of the current keys. Compaction takes this once
    /// at its start and iterates the snapshot, not the live map.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
