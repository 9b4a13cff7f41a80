//! Record codec
//!
//! Encoding and decoding of framed records against the log file.

use crate::error::{Result, StoreError};
use crate::log::LogFile;

use super::Record;

/// A record encoded and framed, ready to append.
#[derive(Debug, Clone)]
pub struct EncodedRecord {
    /// Full frame: header line + payload line
    pub bytes: Vec<u8>,

    /// Byte length of the header line including its newline
    pub header_len: usize,

    /// Byte length of the JSON payload excluding its newline
    pub payload_len: u32,
}

/// A record decoded from the log, with the frame geometry the index needs.
#[derive(Debug, Clone)]
pub struct DecodedRecord {
    pub record: Record,

    /// Absolute offset of the first payload byte
    pub payload_offset: u64,

    /// Byte length of the JSON payload excluding its newline
    pub payload_len: u32,

    /// Offset one past the payload's trailing newline
    pub next_offset: u64,
}

/// Serialize and frame a record.
///
/// Serialization failure surfaces before any log write.
pub fn encode(record: &Record) -> Result<EncodedRecord> {
    let payload =
        serde_json::to_vec(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(frame_payload(&payload))
}

/// Frame already-serialized payload bytes with a fresh header.
///
/// Compaction uses this to carry payloads over byte-identically.
pub fn frame_payload(payload: &[u8]) -> EncodedRecord {
    let header = format!("{} {}\n", payload.len(), crc32fast::hash(payload));
    let mut bytes = Vec::with_capacity(header.len() + payload.len() + 1);
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(payload);
    bytes.push(b'\n');

    EncodedRecord {
        bytes,
        header_len: header.len(),
        payload_len: payload.len() as u32,
    }
}

/// Decode one framed record starting at `offset`.
///
/// Returns `Ok(None)` at clean EOF. Framing and integrity failures map to
/// `MalformedHeader`, `MalformedFrame`, `ChecksumMismatch` and
/// `CorruptRecord`; recovery treats all of them as the logical end of the
/// log.
pub fn decode_at(log: &mut LogFile, offset: u64) -> Result<Option<DecodedRecord>> {
    let (header, payload_offset) = match log.read_line_at(offset)? {
        Some(line) => line,
        None => return Ok(None),
    };

    let (payload_len, checksum) = parse_header(&header)?;

    let payload = read_frame_bytes(log, payload_offset, payload_len as usize)?;

    let newline = read_frame_bytes(log, payload_offset + payload_len as u64, 1)?;
    if newline != b"\n" {
        return Err(StoreError::MalformedFrame(
            "payload is not terminated by a newline".to_string(),
        ));
    }

    let actual = crc32fast::hash(&payload);
    if actual != checksum {
        return Err(StoreError::ChecksumMismatch {
            expected: checksum,
            actual,
        });
    }

    let record: Record =
        serde_json::from_slice(&payload).map_err(|e| StoreError::CorruptRecord(e.to_string()))?;

    Ok(Some(DecodedRecord {
        record,
        payload_offset,
        payload_len,
        next_offset: payload_offset + payload_len as u64 + 1,
    }))
}

/// Parse a header line: two ASCII decimals separated by a single space.
fn parse_header(line: &[u8]) -> Result<(u32, u32)> {
    let malformed = || {
        StoreError::MalformedHeader(format!(
            "expected '<length> <checksum>', got {:?}",
            String::from_utf8_lossy(line)
        ))
    };

    let text = std::str::from_utf8(line).map_err(|_| malformed())?;
    let (len, crc) = text.split_once(' ').ok_or_else(malformed)?;

    if len.is_empty()
        || crc.is_empty()
        || !len.bytes().all(|b| b.is_ascii_digit())
        || !crc.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(malformed());
    }

    Ok((
        len.parse().map_err(|_| malformed())?,
        crc.parse().map_err(|_| malformed())?,
    ))
}

/// Positioned read that reports a short read as a torn frame.
fn read_frame_bytes(log: &mut LogFile, offset: u64, len: usize) -> Result<Vec<u8>> {
    log.read_exact_at(offset, len).map_err(|e| match e {
        StoreError::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            StoreError::MalformedFrame(format!("log ends inside a {len}-byte frame segment"))
        }
        other => other,
    })
}
