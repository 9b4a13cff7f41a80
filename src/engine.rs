//! Engine Module
//!
//! The core storage engine that composes the record codec, log file,
//! index and recency cache.
//!
//! ## Responsibilities
//! - PUT / GET / DELETE / TTL / COMPACT / STATS
//! - Rebuild the index from the log on startup (crash recovery)
//! - Truncate torn tails left by a crash mid-write
//! - Lazy expiry of TTL'd keys on read
//!
//! Every operation runs to completion before the next begins: the engine
//! is single-writer, single-reader within one execution context, and all
//! operations take `&mut self`. A multi-threaded host serializes access
//! through a single critical section; the TCP server does this by giving
//! the engine its own thread and queueing commands to it.

use std::fs;
use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;

use crate::cache::RecencyCache;
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::index::{Index, IndexEntry};
use crate::log::LogFile;
use crate::record::{self, Record};

/// Current Unix time in whole seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn is_expired(expiry: u64, now: u64) -> bool {
    expiry != 0 && expiry <= now
}

/// Per-engine activity counters. Not persisted; they describe the current
/// process's activity since open.
#[derive(Debug, Default)]
struct Counters {
    put_count: u64,
    delete_count: u64,
    last_compaction_time: Option<u64>,
}

/// Snapshot returned by [`Engine::stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub keys_in_index: usize,
    pub keys_in_cache: usize,
    pub put_count: u64,
    pub delete_count: u64,
    pub file_size_bytes: u64,
    /// Unix seconds of the last successful compaction, `None` if never.
    pub last_compaction_time: Option<u64>,
}

/// The main storage engine.
pub struct Engine {
    config: Config,
    log: LogFile,
    index: Index,
    cache: RecencyCache,
    counters: Counters,
    closed: bool,
}

impl Engine {
    /// Open or create an engine with the given config.
    ///
    /// On startup:
    /// 1. Create the log file (and parent directory) if missing
    /// 2. Open independent read and append handles
    /// 3. Replay the log to rebuild the index, truncating any torn tail
    pub fn open(config: Config) -> Result<Self> {
        let capacity = NonZeroUsize::new(config.cache_capacity).ok_or_else(|| {
            StoreError::Config("cache_capacity must be a positive integer".to_string())
        })?;

        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let log = LogFile::open(&config.path)?;
        let mut engine = Engine {
            log,
            index: Index::new(),
            cache: RecencyCache::new(capacity),
            counters: Counters::default(),
            config,
            closed: false,
        };
        engine.recover()?;
        Ok(engine)
    }

    /// Open with a path and default config (convenience method).
    pub fn open_path(path: impl Into<PathBuf>) -> Result<Self> {
        Engine::open(Config::builder().path(path).build())
    }

    // -------------------------------------------------------------------------
    // Recovery
    // -------------------------------------------------------------------------

    /// Replay the log from offset 0 and rebuild the index.
    ///
    /// The first framing or integrity failure is treated as the logical
    /// end of the log (a torn write from a prior crash); the file is then
    /// truncated to the last fully-valid record boundary so the tail
    /// cannot accumulate across restarts. Expired keys are still indexed
    /// here because a later tombstone or overwrite may supersede them;
    /// GET expires them lazily.
    fn recover(&mut self) -> Result<()> {
        self.index.clear();
        let mut pos = 0u64;
        let mut replayed = 0u64;

        loop {
            match record::decode_at(&mut self.log, pos) {
                Ok(Some(decoded)) => {
                    match decoded.record {
                        Record::Put { key, expiry, .. } => {
                            self.index.insert(
                                key,
                                IndexEntry {
                                    offset: decoded.payload_offset,
                                    len: decoded.payload_len,
                                    expiry,
                                },
                            );
                        }
                        Record::Delete { key } => {
                            self.index.remove(&key);
                        }
                    }
                    pos = decoded.next_offset;
                    replayed += 1;
                }
                Ok(None) => break,
                Err(
                    StoreError::MalformedHeader(_)
                    | StoreError::MalformedFrame(_)
                    | StoreError::ChecksumMismatch { .. }
                    | StoreError::CorruptRecord(_),
                ) => break,
                Err(other) => return Err(other),
            }
        }

        if pos < self.log.size() {
            let dropped = self.log.size() - pos;
            self.log.truncate(pos)?;
            tracing::warn!(dropped_bytes = dropped, "truncated torn log tail");
        }

        tracing::debug!(
            records = replayed,
            keys = self.index.len(),
            "log replay complete"
        );
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Append a PUT record and make it the key's live version.
    ///
    /// A `ttl` of `None` or `Some(0)` stores no expiry; otherwise the
    /// record expires `ttl` seconds from now. The write is durable once
    /// this returns.
    pub fn put(&mut self, key: &str, value: Value, ttl: Option<u64>) -> Result<()> {
        let expiry = match ttl {
            None | Some(0) => 0,
            Some(secs) => unix_now() + secs,
        };

        // Serialization failure aborts before any log write.
        let record = Record::put(key, value.clone(), expiry);
        let encoded = record::encode(&record)?;

        let offset = self.log.append(&encoded.bytes)?;
        self.log.sync()?;

        self.index.insert(
            key,
            IndexEntry {
                offset: offset + encoded.header_len as u64,
                len: encoded.payload_len,
                expiry,
            },
        );
        self.cache.insert(key, value);
        self.counters.put_count += 1;
        Ok(())
    }

    /// Read the live value for `key`, or `None` if absent or expired.
    ///
    /// The first GET after a key's expiry evicts it from both index and
    /// cache. A framing or integrity failure on a record the index
    /// trusts surfaces as `DataCorruption`; the engine stays open.
    pub fn get(&mut self, key: &str) -> Result<Option<Value>> {
        let entry = match self.index.get(key) {
            Some(entry) => *entry,
            None => return Ok(None),
        };

        if is_expired(entry.expiry, unix_now()) {
            self.index.remove(key);
            self.cache.invalidate(key);
            return Ok(None);
        }

        if let Some(value) = self.cache.lookup(key) {
            return Ok(Some(value));
        }

        let value = self.read_value(key, entry)?;
        self.cache.insert(key, value.clone());
        Ok(Some(value))
    }

    /// Append a tombstone for `key`.
    ///
    /// The tombstone is written even when the key is absent, which keeps
    /// the operation idempotent with respect to the log and needs no
    /// pre-read. Returns whether the key had been live.
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        let was_live = self
            .index
            .get(key)
            .is_some_and(|entry| !is_expired(entry.expiry, unix_now()));

        let encoded = record::encode(&Record::delete(key))?;
        self.log.append(&encoded.bytes)?;
        self.log.sync()?;

        self.index.remove(key);
        self.cache.invalidate(key);
        self.counters.delete_count += 1;
        Ok(was_live)
    }

    /// Reset the TTL of a live key by rewriting its record.
    ///
    /// Fails with `KeyNotFound` when the key is absent or expired. The
    /// current value is read from the log without touching the cache and
    /// re-appended through the PUT path; the old record becomes garbage
    /// reclaimed by the next compaction.
    pub fn ttl(&mut self, key: &str, ttl: u64) -> Result<()> {
        let entry = match self.index.get(key) {
            Some(entry) => *entry,
            None => return Err(StoreError::KeyNotFound),
        };

        if is_expired(entry.expiry, unix_now()) {
            self.index.remove(key);
            self.cache.invalidate(key);
            return Err(StoreError::KeyNotFound);
        }

        let value = self.read_value(key, entry)?;
        self.put(key, value, Some(ttl))
    }

    /// Rewrite the log to contain only the latest record of each live key.
    ///
    /// Builds `<path>.compact` from the index snapshot (payload bytes are
    /// carried over verbatim under fresh framing), syncs it, atomically
    /// replaces the live log, then rebuilds the index by replaying the
    /// new file and clears the cache. Mutually exclusive with all other
    /// operations.
    pub fn compact(&mut self) -> Result<()> {
        let temp_path = {
            let mut os = self.config.path.clone().into_os_string();
            os.push(".compact");
            PathBuf::from(os)
        };

        let now = unix_now();
        let before = self.log.size();

        let mut temp = LogFile::open(&temp_path)?;
        // A leftover temp file from an interrupted compaction is stale.
        temp.truncate(0)?;

        // Sorted snapshot makes repeated compactions byte-identical.
        let mut keys = self.index.keys();
        keys.sort_unstable();

        for key in keys {
            let entry = match self.index.get(&key) {
                Some(entry) => *entry,
                None => continue,
            };
            if is_expired(entry.expiry, now) {
                continue;
            }

            let payload = self.log.read_exact_at(entry.offset, entry.len as usize)?;
            let framed = record::frame_payload(&payload);
            temp.append(&framed.bytes)?;
        }

        temp.sync()?;
        drop(temp);

        self.log.atomic_replace(&temp_path)?;
        self.recover()?;
        self.cache.clear();
        self.counters.last_compaction_time = Some(now);

        tracing::info!(
            before_bytes = before,
            after_bytes = self.log.size(),
            keys = self.index.len(),
            "compaction complete"
        );
        Ok(())
    }

    /// Snapshot of engine statistics.
    pub fn stats(&self) -> Stats {
        Stats {
            keys_in_index: self.index.len(),
            keys_in_cache: self.cache.len(),
            put_count: self.counters.put_count,
            delete_count: self.counters.delete_count,
            file_size_bytes: self.log.size(),
            last_compaction_time: self.counters.last_compaction_time,
        }
    }

    /// Flush and sync the log. Idempotent; `Drop` releases the file
    /// handles on all exit paths, so an engine bound to a scope is
    /// released even on panic.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.log.sync()?;
        self.closed = true;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Read and parse the payload an index entry points at, without
    /// touching the cache.
    fn read_value(&mut self, key: &str, entry: IndexEntry) -> Result<Value> {
        let payload = self
            .log
            .read_exact_at(entry.offset, entry.len as usize)
            .map_err(|e| match e {
                StoreError::Io(io) if io.kind() == ErrorKind::UnexpectedEof => {
                    StoreError::DataCorruption(format!(
                        "index for '{key}' points past the end of the log"
                    ))
                }
                other => other,
            })?;

        let record: Record = serde_json::from_slice(&payload).map_err(|e| {
            StoreError::DataCorruption(format!("indexed record for '{key}' failed to parse: {e}"))
        })?;

        match record {
            Record::Put { value, .. } => Ok(value),
            Record::Delete { .. } => Err(StoreError::DataCorruption(format!(
                "index for '{key}' points at a tombstone"
            ))),
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
