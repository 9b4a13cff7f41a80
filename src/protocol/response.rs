//! Response formatting
//!
//! Renders engine results as protocol response lines.

use std::fmt;

use crate::engine::Stats;

/// A response to send to the client. `Display` renders the wire form
/// without the trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ok,
    Value(String),
    NotFound,
    Deleted,
    Stats(Stats),
    Error(String),
}

impl Response {
    /// Map an engine error to its wire form: logical absence is
    /// `NOT_FOUND`, everything else is `ERR <kind>`.
    pub fn from_error(err: &crate::error::StoreError) -> Self {
        match err {
            crate::error::StoreError::KeyNotFound => Response::NotFound,
            other => Response::Error(other.kind_name().to_string()),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ok => write!(f, "OK"),
            Response::Value(value) => write!(f, "VALUE {value}"),
            Response::NotFound => write!(f, "NOT_FOUND"),
            Response::Deleted => write!(f, "DELETED"),
            Response::Stats(stats) => {
                writeln!(f, "keys_in_index: {}", stats.keys_in_index)?;
                writeln!(f, "keys_in_cache: {}", stats.keys_in_cache)?;
                writeln!(f, "put_count: {}", stats.put_count)?;
                writeln!(f, "delete_count: {}", stats.delete_count)?;
                writeln!(f, "file_size_bytes: {}", stats.file_size_bytes)?;
                match stats.last_compaction_time {
                    Some(ts) => write!(f, "last_compaction_time: {ts}"),
                    None => write!(f, "last_compaction_time: null"),
                }
            }
            Response::Error(reason) => write!(f, "ERR {reason}"),
        }
    }
}
