//! Connection Handler
//!
//! Owns one client socket: sends the greeting, reads command lines,
//! forwards them to the engine thread, and writes responses back. The
//! connection never touches the engine directly.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{bounded, Sender};

use crate::error::{Result, StoreError};
use crate::protocol::{Command, Response};

use super::Request;

/// Greeting sent on connect.
pub const GREETING: &str = "Welcome to KVStore Server";

/// Handles a single client connection.
pub struct Connection {
    stream: TcpStream,
    requests: Sender<Request>,
    shutdown: Arc<AtomicBool>,
    peer: String,
}

impl Connection {
    pub fn new(stream: TcpStream, requests: Sender<Request>, shutdown: Arc<AtomicBool>) -> Self {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        Connection {
            stream,
            requests,
            shutdown,
            peer,
        }
    }

    /// Set socket timeouts. The read timeout doubles as the interval at
    /// which an idle connection re-checks the shutdown flag.
    pub fn set_timeouts(&self, read_ms: u64, write_ms: u64) -> Result<()> {
        self.stream
            .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        self.stream
            .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        Ok(())
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer
    }

    /// Serve the connection until the client leaves, asks to EXIT, or the
    /// server shuts down.
    pub fn handle(&mut self) -> Result<()> {
        self.send_line(GREETING)?;

        let mut reader = BufReader::new(self.stream.try_clone()?);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break, // client closed
                Ok(_) => {}
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    if self.shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    continue;
                }
                Err(e) if e.kind() == ErrorKind::ConnectionReset => break,
                Err(e) => return Err(e.into()),
            }

            let text = line.trim();
            tracing::debug!(peer = %self.peer, command = text, "received");

            let command = match Command::parse(text) {
                Ok(command) => command,
                Err(StoreError::Protocol(reason)) => {
                    self.send_line(&Response::Error(reason).to_string())?;
                    continue;
                }
                Err(other) => {
                    self.send_line(&Response::from_error(&other).to_string())?;
                    continue;
                }
            };

            match command {
                Command::Shutdown => {
                    self.send_line(&Response::Ok.to_string())?;
                    self.shutdown.store(true, Ordering::Relaxed);
                    break;
                }
                Command::Exit => {
                    self.send_line(&Response::Ok.to_string())?;
                    break;
                }
                command => {
                    let response = self.round_trip(command);
                    self.send_line(&response.to_string())?;
                }
            }
        }

        Ok(())
    }

    /// Hand one command to the engine thread and wait for its reply.
    fn round_trip(&self, command: Command) -> Response {
        let (reply, response) = bounded(1);
        if self.requests.send(Request { command, reply }).is_err() {
            return Response::Error("engine is shut down".to_string());
        }
        response
            .recv()
            .unwrap_or_else(|_| Response::Error("engine is shut down".to_string()))
    }

    fn send_line(&mut self, text: &str) -> Result<()> {
        self.stream.write_all(text.as_bytes())?;
        self.stream.write_all(b"\n")?;
        self.stream.flush()?;
        Ok(())
    }
}
