//! Network Module
//!
//! TCP front end for the line protocol.
//!
//! ## Architecture
//! - One engine thread owns the engine outright and applies commands one
//!   at a time from a bounded queue; that thread is the single critical
//!   section the engine's execution model requires, so the engine itself
//!   never needs a lock
//! - One thread per client connection parses lines, forwards commands to
//!   the engine thread, and writes the replies back
//! - A shared shutdown flag, settable from any connection's SHUTDOWN
//!   command, winds the acceptor, the connections, and finally the
//!   engine thread down in that order

mod connection;
mod server;

use crossbeam::channel::Sender;

use crate::protocol::{Command, Response};

pub use connection::Connection;
pub use server::Server;

/// A parsed command in flight to the engine thread, carrying the channel
/// its response comes back on.
pub(crate) struct Request {
    pub(crate) command: Command,
    pub(crate) reply: Sender<Response>,
}
