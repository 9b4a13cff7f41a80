//! Error types for BitStore
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for BitStore operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Record Framing Errors
    // -------------------------------------------------------------------------
    #[error("malformed record header: {0}")]
    MalformedHeader(String),

    #[error("malformed record frame: {0}")]
    MalformedFrame(String),

    #[error("checksum mismatch: header says {expected}, payload hashes to {actual}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    /// An indexed record failed framing or integrity checks on read.
    /// The operation fails but the engine stays open.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    #[error("key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("network error: {0}")]
    Network(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Short machine-style name for the error kind, used by the TCP server
    /// when mapping engine failures to `ERR <kind>` responses.
    pub fn kind_name(&self) -> &'static str {
        match self {
            StoreError::Io(_) => "io",
            StoreError::MalformedHeader(_) => "malformed_header",
            StoreError::MalformedFrame(_) => "malformed_frame",
            StoreError::ChecksumMismatch { .. } => "checksum_mismatch",
            StoreError::CorruptRecord(_) => "corrupt_record",
            StoreError::DataCorruption(_) => "data_corruption",
            StoreError::KeyNotFound => "not_found",
            StoreError::Serialization(_) => "serialization",
            StoreError::Network(_) => "network",
            StoreError::Protocol(_) => "protocol",
            StoreError::Config(_) => "config",
        }
    }
}
