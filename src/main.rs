//! Delayed password hashing service
//!
//! Binary entry point: parses CLI arguments, initializes logging, wires
//! the shared server state together, and runs the accept loop until a
//! shutdown is requested over HTTP or by signal.

// Use mimalloc as the global allocator for better performance
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use hashserve::logger::{self, log};
use hashserve::{config, server, server_runner};

use anyhow::Result;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = config::CliArgs::parse_args();
    cli.validate()?;

    // Initialize logger
    logger::init_logger(&cli.log_mode);

    let server_config = config::ServerConfig::from_cli(&cli);

    log::info!(
        host = %server_config.host,
        port = server_config.port,
        "Starting hashserve"
    );

    let hash_server = Arc::new(
        server::HashServer::builder()
            .hash_delay(server_config.hash_delay)
            .build(),
    );

    // Signals feed the same drain path as GET /shutdown
    let shutdown = Arc::clone(&hash_server.shutdown);
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigint = signal(SignalKind::interrupt()).expect("Failed to setup SIGINT");
            let mut sigterm = signal(SignalKind::terminate()).expect("Failed to setup SIGTERM");

            tokio::select! {
                _ = sigint.recv() => {
                    log::info!("SIGINT received, shutting down...");
                }
                _ = sigterm.recv() => {
                    log::info!("SIGTERM received, shutting down...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await.ok();
            log::info!("Shutdown signal received...");
        }

        shutdown.begin_drain();
    });

    let listener = server_runner::bind_listener(&server_config)?;
    server_runner::run_server(hash_server, listener, &server_config).await
}
