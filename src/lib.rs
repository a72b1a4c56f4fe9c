//! Delayed password hashing service
//!
//! Architecture:
//! - `digest`: pure SHA-512 + base64 password digest
//! - `delay`: timer-gated digest computation (the delay is a floor)
//! - `stats`: process-wide request count / latency aggregator
//! - `shutdown`: drain protocol (`Running -> Draining -> Stopped`)
//! - `handler`: HTTP endpoint dispatch for /hash, /stats, /shutdown
//! - `server_runner`: listener setup and accept loop

pub mod config;
pub mod delay;
pub mod digest;
pub mod error;
pub mod handler;
pub mod logger;
pub mod server;
pub mod server_runner;
pub mod shutdown;
pub mod stats;
