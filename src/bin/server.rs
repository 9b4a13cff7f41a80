//! BitStore Server Binary
//!
//! Starts the TCP line-protocol server.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use bitstore::network::Server;
use bitstore::{Config, Engine};

/// BitStore Server
#[derive(Parser, Debug)]
#[command(name = "bitstore-server")]
#[command(about = "Bitcask-style key-value store with a TCP line protocol")]
#[command(version)]
struct Args {
    /// Path of the append-only log file
    #[arg(short, long, default_value = "./bitstore_data/data.log")]
    path: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    listen: String,

    /// Recency cache capacity (entries)
    #[arg(short, long, default_value = "1000")]
    cache_capacity: usize,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bitstore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("BitStore Server v{}", bitstore::VERSION);
    tracing::info!("log file: {}", args.path);
    tracing::info!("listen address: {}", args.listen);

    let config = Config::builder()
        .path(args.path.as_str())
        .listen_addr(args.listen.as_str())
        .cache_capacity(args.cache_capacity)
        .max_connections(args.max_connections)
        .build();

    let engine = match Engine::open(config.clone()) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("engine initialized successfully");

    let server = Server::new(config);
    if let Err(e) = server.run(engine) {
        tracing::error!("server error: {}", e);
        std::process::exit(1);
    }

    // Clean SHUTDOWN lands here with exit code 0.
    tracing::info!("server stopped");
}
