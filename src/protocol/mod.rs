//! Protocol Module
//!
//! Defines the newline-terminated ASCII wire protocol for client-server
//! communication.
//!
//! ## Commands
//! ```text
//! PUT <key> <value...> [TTL <n>]   → OK | ERR <reason>
//! GET <key>                        → VALUE <value> | NOT_FOUND
//! DEL <key>                        → DELETED | NOT_FOUND
//! TTL <key> <seconds>              → OK | NOT_FOUND
//! STATS                            → multi-line `k: v` pairs
//! COMPACT                          → OK | ERR <reason>
//! SHUTDOWN                         → OK (closes engine, stops server)
//! EXIT                             → OK (closes this connection)
//! ```
//!
//! The greeting on connect is `Welcome to KVStore Server`. Command
//! keywords are case-insensitive; keys and values are case-sensitive.

mod command;
mod response;

pub use command::Command;
pub use response::Response;
