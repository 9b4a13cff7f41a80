//! BitStore CLI Client
//!
//! One-shot client for the TCP line protocol: connects, sends a single
//! command, prints the response lines, and exits. The exchange is
//! strictly sequential, so the one socket is written directly and only
//! wrapped in a reader afterwards; no second handle is ever cloned off
//! it.

use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use clap::{Parser, Subcommand};

/// BitStore CLI
#[derive(Parser, Debug)]
#[command(name = "bitstore-cli")]
#[command(about = "CLI for the BitStore key-value server")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    server: String,

    /// Connection timeout in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a value (value words are joined with spaces)
    Put {
        key: String,

        /// The value to store
        #[arg(required = true)]
        value: Vec<String>,

        /// Expire after this many seconds
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Read a value by key
    Get { key: String },

    /// Delete a key
    Del { key: String },

    /// Reset a live key's TTL
    Ttl { key: String, seconds: u64 },

    /// Show engine statistics
    Stats,

    /// Compact the server's log file
    Compact,

    /// Stop the server
    Shutdown,
}

impl Commands {
    /// Wire form of the command, without the trailing newline.
    fn wire_line(&self) -> String {
        match self {
            Commands::Put { key, value, ttl } => {
                let mut line = format!("PUT {} {}", key, value.join(" "));
                if let Some(secs) = ttl {
                    line.push_str(&format!(" TTL {}", secs));
                }
                line
            }
            Commands::Get { key } => format!("GET {}", key),
            Commands::Del { key } => format!("DEL {}", key),
            Commands::Ttl { key, seconds } => format!("TTL {} {}", key, seconds),
            Commands::Stats => "STATS".to_string(),
            Commands::Compact => "COMPACT".to_string(),
            Commands::Shutdown => "SHUTDOWN".to_string(),
        }
    }

    /// How many response lines the server sends for this command.
    fn response_lines(&self) -> usize {
        match self {
            Commands::Stats => 6,
            _ => 1,
        }
    }
}

fn main() {
    let args = Args::parse();

    let mut stream = match TcpStream::connect_timeout(
        &args.server.parse().expect("invalid server address"),
        Duration::from_millis(args.timeout),
    ) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    let _ = stream.set_read_timeout(Some(Duration::from_millis(args.timeout)));
    let _ = stream.set_write_timeout(Some(Duration::from_millis(args.timeout)));

    // One command per connection; nothing to gain from batching sends.
    let _ = stream.set_nodelay(true);

    let line = args.command.wire_line();
    if let Err(e) = stream.write_all(format!("{}\n", line).as_bytes()) {
        eprintln!("failed to send command: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = stream.flush() {
        eprintln!("failed to flush command: {}", e);
        std::process::exit(1);
    }

    let mut reader = BufReader::new(&stream);

    // First line on the wire is the greeting.
    let mut greeting = String::new();
    if let Err(e) = reader.read_line(&mut greeting) {
        eprintln!("failed to read greeting: {}", e);
        std::process::exit(1);
    }

    let mut failed = false;
    for _ in 0..args.command.response_lines() {
        let mut response = String::new();
        match reader.read_line(&mut response) {
            Ok(0) => break,
            Ok(_) => {
                let response = response.trim_end();
                if response.starts_with("ERR ") {
                    failed = true;
                    eprintln!("{}", response);
                } else {
                    println!("{}", response);
                }
            }
            Err(e) => {
                eprintln!("failed to read response: {}", e);
                std::process::exit(1);
            }
        }
    }

    // The exchange is over; give the server's reader an EOF now rather
    // than letting the connection idle out.
    let _ = stream.shutdown(Shutdown::Write);
    drop(reader);
    drop(stream);

    if failed {
        std::process::exit(1);
    }
}
