//! Configuration module
//!
//! CLI argument parsing with environment variable support. The service
//! has no config file; everything is flags or `HASHSERVE_*` variables.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::time::Duration;

/// Parse duration string (e.g., "60s", "2m", "1h") or plain seconds
fn parse_duration(s: &str) -> Result<Duration, String> {
    // Try parsing as humantime duration first (e.g., "5s", "2m", "1h30m")
    if let Ok(d) = humantime::parse_duration(s) {
        return Ok(d);
    }
    // Fall back to parsing as plain seconds for backwards compatibility
    s.parse::<u64>().map(Duration::from_secs).map_err(|_| {
        format!(
            "Invalid duration '{}'. Use formats like '5s', '2m', '1h' or plain seconds",
            s
        )
    })
}

/// CLI arguments for the hash service
///
/// Supports environment variables with HASHSERVE_ prefix
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Delayed password hashing service")]
#[command(rename_all = "snake_case")]
pub struct CliArgs {
    /// Listen host (e.g., "0.0.0.0")
    #[arg(long, env = "HASHSERVE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Listen port
    #[arg(long, env = "HASHSERVE_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Delay floor applied to every hash response (e.g., "5s")
    #[arg(long, env = "HASHSERVE_HASH_DELAY", default_value = "5s", value_parser = parse_duration)]
    pub hash_delay: Duration,

    /// Grace period for in-flight requests during shutdown (e.g., "10s")
    #[arg(long, env = "HASHSERVE_DRAIN_GRACE", default_value = "10s", value_parser = parse_duration)]
    pub drain_grace: Duration,

    /// Log mode: debug, info, warn, error (default: info)
    #[arg(long, env = "HASHSERVE_LOG_MODE", default_value = "info")]
    pub log_mode: String,

    /// TCP listen backlog for pending connections (default: 1024)
    #[arg(
        long,
        env = "HASHSERVE_TCP_BACKLOG",
        default_value_t = 1024,
        help_heading = "Performance"
    )]
    pub tcp_backlog: i32,

    /// Enable TCP_NODELAY for lower latency (default: true)
    #[arg(
        long,
        env = "HASHSERVE_TCP_NODELAY",
        default_value_t = true,
        help_heading = "Performance"
    )]
    pub tcp_nodelay: bool,
}

impl CliArgs {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port must be non-zero"));
        }
        if self.drain_grace < self.hash_delay {
            return Err(anyhow!(
                "drain_grace ({:?}) must cover at least one hash_delay ({:?}), \
                 or in-flight requests can never finish draining",
                self.drain_grace,
                self.hash_delay
            ));
        }
        Ok(())
    }
}

/// Runtime server configuration, derived from CLI arguments
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub hash_delay: Duration,
    pub drain_grace: Duration,
    pub tcp_backlog: i32,
    pub tcp_nodelay: bool,
}

impl ServerConfig {
    pub fn from_cli(cli: &CliArgs) -> Self {
        Self {
            host: cli.host.clone(),
            port: cli.port,
            hash_delay: cli.hash_delay,
            drain_grace: cli.drain_grace,
            tcp_backlog: cli.tcp_backlog,
            tcp_nodelay: cli.tcp_nodelay,
        }
    }
}
