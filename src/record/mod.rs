//! Record Module
//!
//! Framing, checksumming and (de)serialization of single log records.
//!
//! ## File Format
//! Each record is a UTF-8 JSON object on one line, preceded by a header
//! line. The two lines together are one record:
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ <payload_length> <checksum>\n        │
//! ├──────────────────────────────────────┤
//! │ <json_payload>\n                     │
//! └──────────────────────────────────────┘
//! ```
//!
//! `payload_length` is the byte count of the JSON payload excluding its
//! trailing newline; `checksum` is CRC-32 (IEEE) of exactly those bytes.
//! Both are decimal ASCII separated by a single space.
//!
//! The codec does not interpret `op`; resolving puts against tombstones
//! is the engine's job.

mod codec;
mod entry;

pub use codec::{decode_at, encode, frame_payload, DecodedRecord, EncodedRecord};
pub use entry::Record;
