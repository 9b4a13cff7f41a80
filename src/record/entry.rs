//! Record definitions
//!
//! Defines the two record variants stored in the log.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single log record.
///
/// Serializes to `{"op":"put","key":...,"value":...,"expiry":...}` or
/// `{"op":"delete","key":...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Record {
    /// Insert or overwrite a key. `expiry` of 0 means no expiry,
    /// otherwise absolute Unix seconds.
    Put {
        key: String,
        value: Value,
        expiry: u64,
    },

    /// Tombstone marking a key as removed.
    Delete { key: String },
}

impl Record {
    pub fn put(key: impl Into<String>, value: Value, expiry: u64) -> Self {
        Record::Put {
            key: key.into(),
            value,
            expiry,
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Record::Delete { key: key.into() }
    }

    /// The key this record affects.
    pub fn key(&self) -> &str {
        match self {
            Record::Put { key, .. } => key,
            Record::Delete { key } => key,
        }
    }
}
