//! Reference-counted lifecycle of the shared foreground scanner
//!
//! The scanner runs while at least one consumer holds it: started on the
//! first acquisition, stopped when the last holder releases. This is the only
//! component allowed to start or stop the scanner.
//!
//! Acquire and release are meant to run on the UI thread. The internal lock
//! only guards the counts; it does not make concurrent callers a supported
//! pattern.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use beeper_api::ForegroundScanner;
use parking_lot::Mutex;

/// Logical consumers of the foreground scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Consumer {
    /// An active device search on the device channel
    DeviceSearch,
    /// An active subscription on the location channel
    LocationSubscription,
}

impl fmt::Display for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consumer::DeviceSearch => f.write_str("device-search"),
            Consumer::LocationSubscription => f.write_str("location-subscription"),
        }
    }
}

/// Owner of the foreground scanner
pub struct ScannerLifecycle {
    scanner: Arc<dyn ForegroundScanner>,
    refs: Mutex<HashMap<Consumer, usize>>,
}

impl ScannerLifecycle {
    pub fn new(scanner: Arc<dyn ForegroundScanner>) -> Self {
        Self {
            scanner,
            refs: Mutex::new(HashMap::new()),
        }
    }

    /// Record one acquisition by `consumer`, starting the scanner on 0 -> 1
    ///
    /// Acquiring twice for the same consumer without a release in between is a
    /// caller error; it is counted, not rejected. Use [`Self::is_held`] to
    /// avoid it.
    pub fn acquire(&self, consumer: Consumer) {
        let mut refs = self.refs.lock();
        let total_before: usize = refs.values().sum();

        let count = refs.entry(consumer).or_insert(0);
        if *count > 0 {
            tracing::warn!("{} acquired the scanner again without releasing it", consumer);
        }
        *count += 1;

        tracing::debug!(
            "Scanner reference count: {} -> {} (acquired by {})",
            total_before,
            total_before + 1,
            consumer
        );

        if total_before == 0 {
            // Someone else may have started it; a second start is not free.
            if self.scanner.is_started() {
                tracing::debug!("Foreground scanner already running");
            } else {
                tracing::info!("Starting foreground scanner");
                self.scanner.start();
            }
        }
    }

    /// Record one release by `consumer`, stopping the scanner on 1 -> 0
    ///
    /// Releasing a consumer that holds nothing is logged and ignored.
    pub fn release(&self, consumer: Consumer) {
        let mut refs = self.refs.lock();

        let Some(count) = refs.get_mut(&consumer) else {
            tracing::warn!(
                "Attempted to release the scanner for {} but it holds no reference",
                consumer
            );
            return;
        };

        *count -= 1;
        if *count == 0 {
            refs.remove(&consumer);
        }

        let total_after: usize = refs.values().sum();
        tracing::debug!(
            "Scanner reference count: {} -> {} (released by {})",
            total_after + 1,
            total_after,
            consumer
        );

        if total_after == 0 {
            tracing::info!("Stopping foreground scanner");
            self.scanner.stop();
        }
    }

    pub fn is_held(&self, consumer: Consumer) -> bool {
        self.refs.lock().get(&consumer).map_or(false, |&c| c > 0)
    }

    /// Total number of outstanding acquisitions
    pub fn ref_count(&self) -> usize {
        self.refs.lock().values().sum()
    }

    /// Whether the scanner should currently be running
    pub fn is_active(&self) -> bool {
        self.ref_count() > 0
    }
}

impl Drop for ScannerLifecycle {
    fn drop(&mut self) {
        let outstanding: usize = self.refs.get_mut().values().sum();
        if outstanding > 0 {
            tracing::debug!(
                "ScannerLifecycle dropping with {} outstanding references, stopping scanner",
                outstanding
            );
            self.scanner.stop();
        }
    }
}
