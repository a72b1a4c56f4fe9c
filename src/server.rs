//! Shared server state
//!
//! `HashServer` holds the components every request handler needs: the
//! stats aggregator, the shutdown coordinator, and the response delay.

use std::sync::Arc;
use std::time::Duration;

use crate::shutdown::ShutdownCoordinator;
use crate::stats::ResponseStats;

/// Default floor applied to every hash response.
pub const DEFAULT_HASH_DELAY: Duration = Duration::from_secs(5);

/// Shared state for the HTTP service.
pub struct HashServer {
    /// Aggregate request statistics
    pub stats: Arc<ResponseStats>,
    /// Drain protocol state machine
    pub shutdown: Arc<ShutdownCoordinator>,
    /// Delay floor for hash responses
    pub hash_delay: Duration,
}

impl HashServer {
    /// Create a new server builder
    pub fn builder() -> HashServerBuilder {
        HashServerBuilder::new()
    }
}

/// Builder for constructing a `HashServer`
pub struct HashServerBuilder {
    stats: Option<Arc<ResponseStats>>,
    shutdown: Option<Arc<ShutdownCoordinator>>,
    hash_delay: Option<Duration>,
}

impl Default for HashServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HashServerBuilder {
    pub fn new() -> Self {
        Self {
            stats: None,
            shutdown: None,
            hash_delay: None,
        }
    }

    /// Set the stats aggregator (a fresh one is created by default)
    pub fn stats(mut self, stats: Arc<ResponseStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Set the shutdown coordinator (a fresh one is created by default)
    pub fn shutdown(mut self, shutdown: Arc<ShutdownCoordinator>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Set the hash response delay floor (default 5s)
    pub fn hash_delay(mut self, delay: Duration) -> Self {
        self.hash_delay = Some(delay);
        self
    }

    pub fn build(self) -> HashServer {
        HashServer {
            stats: self.stats.unwrap_or_default(),
            shutdown: self.shutdown.unwrap_or_default(),
            hash_delay: self.hash_delay.unwrap_or(DEFAULT_HASH_DELAY),
        }
    }
}
