//! Coordinated shutdown
//!
//! Three-state drain protocol: `Running -> Draining -> Stopped`, strictly
//! forward. Admission of new hash work is atomic with respect to the
//! transition into `Draining`, and the server runner waits for all
//! admitted work (bounded by a grace period) before the process stops.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

const RUNNING: u8 = 0;
const DRAINING: u8 = 1;
const STOPPED: u8 = 2;

/// Observable lifecycle state. Other components only ever need the
/// `Running` vs not-`Running` distinction to decide admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    Draining,
    Stopped,
}

/// Owns the shutdown state machine, the accept-loop cancellation token,
/// and the in-flight work barrier.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    state: AtomicU8,
    cancel: CancellationToken,
    in_flight: AtomicUsize,
    idle: Notify,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ShutdownState {
        match self.state.load(Ordering::Acquire) {
            RUNNING => ShutdownState::Running,
            DRAINING => ShutdownState::Draining,
            _ => ShutdownState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == RUNNING
    }

    /// Try to admit one unit of work, returning a guard that must be held
    /// for the work's lifetime.
    ///
    /// The in-flight count is incremented before the state check, so a
    /// drain that begins concurrently either sees the count or this
    /// admission is refused; there is no window where admitted work is
    /// invisible to the drain barrier.
    pub fn admit(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        if self.is_running() {
            Some(InFlightGuard { coordinator: self })
        } else {
            self.release();
            None
        }
    }

    fn release(&self) {
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }

    /// Transition `Running -> Draining` and cancel the accept loop.
    /// Returns true on the first call; later calls are no-ops, whether
    /// the coordinator is draining or already stopped.
    pub fn begin_drain(&self) -> bool {
        if self.state.fetch_max(DRAINING, Ordering::AcqRel) == RUNNING {
            self.cancel.cancel();
            true
        } else {
            false
        }
    }

    /// Resolves once draining has begun. The accept loop selects on this.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Wait until all admitted work has finished, bounded by `grace`.
    /// Returns true if the in-flight count reached zero in time.
    pub async fn wait_for_inflight(&self, grace: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + grace;
        loop {
            if self.in_flight.load(Ordering::Acquire) == 0 {
                return true;
            }
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // Register the waiter before the re-check; `notified()` alone
            // does not register until first polled, so a release landing
            // between the re-check and the await would otherwise be missed
            notified.as_mut().enable();
            if self.in_flight.load(Ordering::Acquire) == 0 {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.in_flight.load(Ordering::Acquire) == 0;
            }
        }
    }

    /// Final transition to `Stopped`. Forward-only: a stopped coordinator
    /// never leaves that state.
    pub fn mark_stopped(&self) {
        self.state.fetch_max(STOPPED, Ordering::AcqRel);
    }
}

/// RAII guard for one admitted unit of work. Dropping it releases the
/// in-flight slot and wakes the drain barrier when the count hits zero.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    coordinator: &'a ShutdownCoordinator,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.release();
    }
}
