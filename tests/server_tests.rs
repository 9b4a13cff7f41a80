//! End-to-end tests for the TCP line protocol server
//!
//! Each test boots a real server on a loopback port, drives it with a
//! plain TcpStream client, and shuts it down over the wire.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tempfile::TempDir;

use bitstore::network::Server;
use bitstore::{Config, Engine};

// =============================================================================
// Helper Functions
// =============================================================================

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn start_server() -> (TempDir, String, JoinHandle<bitstore::Result<()>>) {
    let temp_dir = TempDir::new().unwrap();
    let addr = format!("127.0.0.1:{}", free_port());

    let config = Config::builder()
        .path(temp_dir.path().join("data.log"))
        .listen_addr(addr.clone())
        .read_timeout_ms(200)
        .build();

    let engine = Engine::open(config.clone()).unwrap();
    let server = Server::new(config);
    let handle = thread::spawn(move || server.run(engine));

    (temp_dir, addr, handle)
}

struct Client {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl Client {
    /// Connect with retries (the server thread may still be binding) and
    /// consume the greeting.
    fn connect(addr: &str) -> Client {
        let stream = (0..100)
            .find_map(|_| {
                TcpStream::connect(addr).ok().or_else(|| {
                    thread::sleep(Duration::from_millis(20));
                    None
                })
            })
            .expect("server did not come up");

        let mut client = Client {
            reader: BufReader::new(stream.try_clone().unwrap()),
            stream,
        };
        assert_eq!(client.read_line(), "Welcome to KVStore Server");
        client
    }

    fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).unwrap();
        line.trim_end().to_string()
    }

    /// Send one command and read a single-line response.
    fn send(&mut self, command: &str) -> String {
        self.stream
            .write_all(format!("{}\n", command).as_bytes())
            .unwrap();
        self.read_line()
    }

    /// Send one command and read `n` response lines.
    fn send_multi(&mut self, command: &str, n: usize) -> Vec<String> {
        self.stream
            .write_all(format!("{}\n", command).as_bytes())
            .unwrap();
        (0..n).map(|_| self.read_line()).collect()
    }
}

// =============================================================================
// Protocol Session Tests
// =============================================================================

#[test]
fn full_command_session() {
    let (_temp, addr, handle) = start_server();
    let mut client = Client::connect(&addr);

    assert_eq!(client.send("PUT name suraj"), "OK");
    assert_eq!(client.send("GET name"), "VALUE suraj");

    // Values keep their spaces.
    assert_eq!(client.send("PUT city new york city"), "OK");
    assert_eq!(client.send("GET city"), "VALUE new york city");

    assert_eq!(client.send("DEL name"), "DELETED");
    assert_eq!(client.send("GET name"), "NOT_FOUND");
    assert_eq!(client.send("DEL name"), "NOT_FOUND");

    // TTL variants.
    assert_eq!(client.send("PUT session abc TTL 60"), "OK");
    assert_eq!(client.send("TTL session 120"), "OK");
    assert_eq!(client.send("TTL ghost 10"), "NOT_FOUND");

    // Errors.
    assert_eq!(client.send("GET"), "ERR GET requires: GET key");
    assert_eq!(client.send("PUT k v TTL -1"), "ERR TTL must not be negative");
    assert_eq!(client.send("FROB x"), "ERR unknown command: FROB");
    assert_eq!(client.send(""), "ERR empty command");

    // Maintenance.
    assert_eq!(client.send("COMPACT"), "OK");

    let stats = client.send_multi("STATS", 6);
    assert!(stats[0].starts_with("keys_in_index: "));
    assert!(stats[4].starts_with("file_size_bytes: "));
    assert!(stats[5].starts_with("last_compaction_time: "));
    assert_ne!(stats[5], "last_compaction_time: null");

    assert_eq!(client.send("SHUTDOWN"), "OK");
    handle.join().unwrap().unwrap();
}

#[test]
fn exit_closes_only_this_connection() {
    let (_temp, addr, handle) = start_server();

    let mut first = Client::connect(&addr);
    assert_eq!(first.send("PUT shared value"), "OK");
    assert_eq!(first.send("EXIT"), "OK");

    // The first connection is gone; the server keeps serving new ones.
    let mut leftover = String::new();
    assert_eq!(first.reader.read_line(&mut leftover).unwrap(), 0);

    let mut second = Client::connect(&addr);
    assert_eq!(second.send("GET shared"), "VALUE value");
    assert_eq!(second.send("SHUTDOWN"), "OK");
    handle.join().unwrap().unwrap();
}

#[test]
fn shutdown_survives_restart_with_data() {
    let (temp, addr, handle) = start_server();

    let mut client = Client::connect(&addr);
    assert_eq!(client.send("PUT durable yes"), "OK");
    assert_eq!(client.send("SHUTDOWN"), "OK");
    handle.join().unwrap().unwrap();

    // The log replays into a fresh engine.
    let mut engine = Engine::open_path(temp.path().join("data.log")).unwrap();
    assert_eq!(
        engine.get("durable").unwrap(),
        Some(serde_json::json!("yes"))
    );
}
