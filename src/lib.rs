//! # BitStore
//!
//! An embedded, single-node, persistent key-value store in the Bitcask
//! lineage:
//! - All mutations append to a single log file
//! - An in-memory index maps each live key to its latest record
//! - A bounded LRU cache accelerates repeated reads
//! - TTL support with lazy expiry on read
//! - Explicit compaction reclaims superseded and expired records
//! - Crash recovery replays the log and truncates torn tails
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                             │
//! │           (line protocol, thread per connection)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ command queue
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Engine (own thread)                         │
//! │        (PUT / GET / DELETE / TTL / COMPACT / STATS)         │
//! └───────┬──────────────┬──────────────┬───────────────────────┘
//!         │              │              │
//!         ▼              ▼              ▼
//!  ┌────────────┐ ┌────────────┐ ┌──────────────┐
//!  │   Index    │ │   Cache    │ │   Log File   │
//!  │ (HashMap)  │ │   (LRU)    │ │ (append-only)│
//!  └────────────┘ └────────────┘ └──────┬───────┘
//!                                       │
//!                                ┌──────▼───────┐
//!                                │ Record codec │
//!                                │ (JSON + CRC) │
//!                                └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod cache;
pub mod engine;
pub mod index;
pub mod log;
pub mod network;
pub mod protocol;
pub mod record;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use engine::{Engine, Stats};
pub use error::{Result, StoreError};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of BitStore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
