//! TCP Server
//!
//! Accepts connections and routes every command through one
//! engine-owning thread.

use std::io::ErrorKind;
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver};
use serde_json::Value;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{Result, StoreError};
use crate::protocol::{Command, Response};

use super::{Connection, Request};

/// How long the acceptor sleeps between polls of an idle listener.
const ACCEPT_POLL: Duration = Duration::from_millis(25);

/// TCP server for BitStore.
///
/// `run` takes the engine by value and moves it into a dedicated thread;
/// connections talk to that thread over a bounded request queue. Queue
/// order is execution order, which gives every operation the run-to-
/// completion semantics the engine demands without a lock around it.
pub struct Server {
    config: Config,

    /// Set by a client's SHUTDOWN command; unwinds the whole server
    shutdown: Arc<AtomicBool>,

    /// Number of connection threads currently alive
    active: Arc<AtomicUsize>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Server {
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Serve until a SHUTDOWN command arrives (blocking).
    ///
    /// Teardown order: the acceptor stops, connection threads drain
    /// within one read-timeout tick, and the engine thread finishes the
    /// queued commands, closes the engine, and exits.
    pub fn run(&self, engine: Engine) -> Result<()> {
        let listener = TcpListener::bind(&self.config.listen_addr).map_err(|e| {
            StoreError::Network(format!("cannot bind {}: {}", self.config.listen_addr, e))
        })?;
        // The acceptor polls so it can notice the shutdown flag.
        listener.set_nonblocking(true)?;

        tracing::info!(addr = %self.config.listen_addr, "listening for clients");

        let (requests, queue) = bounded::<Request>(self.config.max_connections);
        let engine_thread = thread::Builder::new()
            .name("bitstore-engine".to_string())
            .spawn(move || serve_engine(engine, queue))
            .map_err(|e| StoreError::Network(format!("cannot start engine thread: {e}")))?;

        let mut connections: Vec<JoinHandle<()>> = Vec::new();
        let mut conn_id = 0u64;

        while !self.shutdown.load(Ordering::Relaxed) {
            let stream = match listener.accept() {
                Ok((stream, addr)) => {
                    tracing::debug!(%addr, "client connected");
                    stream
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                    continue;
                }
            };

            reap_finished(&mut connections);

            if self.active.load(Ordering::Relaxed) >= self.config.max_connections {
                tracing::warn!(
                    limit = self.config.max_connections,
                    "refusing client over the connection limit"
                );
                continue; // dropping the stream closes it
            }

            let mut conn = Connection::new(stream, requests.clone(), Arc::clone(&self.shutdown));
            let timeouts =
                conn.set_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms);
            if let Err(e) = timeouts {
                tracing::warn!(peer = conn.peer_addr(), error = %e, "cannot set socket timeouts");
            }

            conn_id += 1;
            self.active.fetch_add(1, Ordering::Relaxed);
            let active = Arc::clone(&self.active);
            let spawned = thread::Builder::new()
                .name(format!("bitstore-conn-{conn_id}"))
                .spawn(move || {
                    if let Err(e) = conn.handle() {
                        tracing::debug!(peer = conn.peer_addr(), error = %e, "connection ended");
                    }
                    active.fetch_sub(1, Ordering::Relaxed);
                });
            match spawned {
                Ok(handle) => connections.push(handle),
                Err(e) => {
                    self.active.fetch_sub(1, Ordering::Relaxed);
                    tracing::error!(error = %e, "cannot spawn connection thread");
                }
            }
        }

        tracing::info!("shutdown requested, draining connections");
        for handle in connections {
            let _ = handle.join();
        }

        // The last request sender is gone once ours drops; the engine
        // thread then drains the queue and closes the engine.
        drop(requests);
        match engine_thread.join() {
            Ok(result) => result?,
            Err(_) => return Err(StoreError::Network("engine thread panicked".to_string())),
        }

        tracing::info!("server stopped");
        Ok(())
    }
}

/// Drop handles of connection threads that have already exited, so the
/// handle list stays bounded on long-running servers.
fn reap_finished(connections: &mut Vec<JoinHandle<()>>) {
    let mut running = Vec::with_capacity(connections.len());
    for handle in connections.drain(..) {
        if handle.is_finished() {
            let _ = handle.join();
        } else {
            running.push(handle);
        }
    }
    *connections = running;
}

/// Body of the engine thread: applies queued commands in arrival order
/// until every sender is gone, then closes the engine.
fn serve_engine(mut engine: Engine, queue: Receiver<Request>) -> Result<()> {
    for request in queue {
        let response = apply(&mut engine, request.command);
        // A connection that gave up waiting is not an engine problem.
        let _ = request.reply.send(response);
    }
    tracing::debug!("request queue closed, closing engine");
    engine.close()
}

/// Apply one protocol command to the engine.
fn apply(engine: &mut Engine, command: Command) -> Response {
    match command {
        Command::Put { key, value, ttl } => match engine.put(&key, Value::String(value), ttl) {
            Ok(()) => Response::Ok,
            Err(e) => Response::from_error(&e),
        },
        Command::Get { key } => match engine.get(&key) {
            Ok(Some(value)) => Response::Value(render_value(&value)),
            Ok(None) => Response::NotFound,
            Err(e) => Response::from_error(&e),
        },
        Command::Del { key } => match engine.delete(&key) {
            Ok(true) => Response::Deleted,
            Ok(false) => Response::NotFound,
            Err(e) => Response::from_error(&e),
        },
        Command::Ttl { key, seconds } => match engine.ttl(&key, seconds) {
            Ok(()) => Response::Ok,
            Err(e) => Response::from_error(&e),
        },
        Command::Stats => Response::Stats(engine.stats()),
        Command::Compact => match engine.compact() {
            Ok(()) => Response::Ok,
            Err(e) => Response::from_error(&e),
        },
        // Resolved connection-side; never queued.
        Command::Shutdown | Command::Exit => Response::Ok,
    }
}

/// String values render as their raw text (the server stored them from
/// line input); anything else renders as JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
