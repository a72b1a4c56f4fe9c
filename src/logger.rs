use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber. RUST_LOG overrides the
/// configured log mode.
pub fn init_logger(log_mode: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hashserve={}", log_mode)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(true)
                .with_ansi(true)
                .compact(),
        )
        .init();
}

pub mod log {
    pub use tracing::{debug, error, info, warn};

    /// Log one served request
    pub fn request(path: &str, status: u16) {
        if status < 400 {
            info!(path = path, status = status, "Request");
        } else {
            warn!(path = path, status = status, "Request");
        }
    }
}
