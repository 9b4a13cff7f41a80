//! Command parsing
//!
//! Turns one line of client input into a validated command.

use crate::error::{Result, StoreError};

/// A parsed client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store a value, optionally expiring after `ttl` seconds
    Put {
        key: String,
        value: String,
        ttl: Option<u64>,
    },

    /// Read a value by key
    Get { key: String },

    /// Delete a key
    Del { key: String },

    /// Reset a live key's TTL
    Ttl { key: String, seconds: u64 },

    /// Engine statistics
    Stats,

    /// Compact the log
    Compact,

    /// Close the engine and stop the server
    Shutdown,

    /// Close this connection only
    Exit,
}

impl Command {
    /// Parse one line of input.
    ///
    /// The value of a PUT is the rest of the line, so it may contain
    /// spaces; a trailing `TTL <n>` pair is recognized as the expiry
    /// option and is not part of the value.
    pub fn parse(line: &str) -> Result<Command> {
        let mut parts = line.split_whitespace();
        let keyword = match parts.next() {
            Some(word) => word.to_ascii_uppercase(),
            None => return Err(StoreError::Protocol("empty command".to_string())),
        };
        let args: Vec<&str> = parts.collect();

        match keyword.as_str() {
            "PUT" => parse_put(&args),
            "GET" => match args.as_slice() {
                [key] => Ok(Command::Get {
                    key: key.to_string(),
                }),
                _ => Err(usage("GET requires: GET key")),
            },
            "DEL" => match args.as_slice() {
                [key] => Ok(Command::Del {
                    key: key.to_string(),
                }),
                _ => Err(usage("DEL requires: DEL key")),
            },
            "TTL" => match args.as_slice() {
                [key, seconds] => Ok(Command::Ttl {
                    key: key.to_string(),
                    seconds: parse_ttl_seconds(seconds)?,
                }),
                _ => Err(usage("TTL requires: TTL key seconds")),
            },
            "STATS" => no_args(&args, Command::Stats, "STATS takes no arguments"),
            "COMPACT" => no_args(&args, Command::Compact, "COMPACT takes no arguments"),
            "SHUTDOWN" => no_args(&args, Command::Shutdown, "SHUTDOWN takes no arguments"),
            "EXIT" => no_args(&args, Command::Exit, "EXIT takes no arguments"),
            other => Err(StoreError::Protocol(format!("unknown command: {other}"))),
        }
    }
}

fn parse_put(args: &[&str]) -> Result<Command> {
    if args.len() < 2 {
        return Err(usage("PUT requires: PUT key value [TTL n]"));
    }

    // A trailing `TTL <n>` pair is the expiry option, not value text.
    let (value_args, ttl) = if args.len() >= 4 && args[args.len() - 2].eq_ignore_ascii_case("TTL") {
        (
            &args[1..args.len() - 2],
            Some(parse_ttl_seconds(args[args.len() - 1])?),
        )
    } else {
        (&args[1..], None)
    };

    Ok(Command::Put {
        key: args[0].to_string(),
        value: value_args.join(" "),
        ttl,
    })
}

/// TTL seconds must be a non-negative decimal integer.
fn parse_ttl_seconds(text: &str) -> Result<u64> {
    if text.starts_with('-') {
        return Err(StoreError::Protocol("TTL must not be negative".to_string()));
    }
    text.parse::<u64>()
        .map_err(|_| StoreError::Protocol(format!("invalid TTL: {text}")))
}

fn no_args(args: &[&str], command: Command, reason: &str) -> Result<Command> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(usage(reason))
    }
}

fn usage(reason: &str) -> StoreError {
    StoreError::Protocol(reason.to_string())
}
