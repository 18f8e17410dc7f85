//! Cooperative cancellation flag shared between the signal handler and the session

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{info, warn};

/// Cloneable shutdown handle.
///
/// The session only ever reads the flag at its checkpoints; in-flight
/// socket I/O is never interrupted. [`ShutdownSignal::pause`] is the only
/// wait that ends early once the flag is raised.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownSignal {
    /// Create a new, untriggered signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag and wake any pending pause
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Check whether shutdown was requested
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Raise the flag once `signal` resolves.
    ///
    /// A signal source that fails, e.g. a handler that cannot be installed,
    /// is logged and leaves the flag untouched. Returns whether the flag was
    /// raised.
    pub async fn trigger_on<F>(&self, name: &str, signal: F) -> bool
    where
        F: Future<Output = io::Result<()>>,
    {
        match signal.await {
            Ok(()) => {
                info!("Received {}", name);
                self.trigger();
                true
            }
            Err(e) => {
                warn!("Cannot install {} handler: {}", name, e);
                false
            }
        }
    }

    /// Sleep for `period`, returning early if shutdown is requested
    pub async fn pause(&self, period: Duration) {
        if period.is_zero() {
            return;
        }

        let notified = self.notify.notified();
        if self.is_triggered() {
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(period) => {}
            _ = notified => {}
        }
    }
}
