//! Queue-backed result sink for hosts that pull results
//!
//! A command answers through its sink either once (a final result) or many
//! times (`keep_callback` events) followed by an optional terminal status.
//! [`ResultQueue`] reads that stream back with this distinction in mind.

use std::sync::mpsc::{self, RecvTimeoutError, TryIter};
use std::sync::Arc;
use std::time::{Duration, Instant};

use beeper_api::{PluginResult, ResultSink};

/// [`ResultSink`] that pushes every result onto a queue
pub struct QueueSink {
    tx: mpsc::Sender<PluginResult>,
}

impl ResultSink for QueueSink {
    fn send(&self, result: PluginResult) {
        if self.tx.send(result).is_err() {
            tracing::trace!("Result queue dropped, result discarded");
        }
    }
}

/// Create a connected sink/queue pair
pub fn queue_sink() -> (Arc<QueueSink>, ResultQueue) {
    let (tx, rx) = mpsc::channel();
    (Arc::new(QueueSink { tx }), ResultQueue { rx })
}

/// Receiving end of a [`QueueSink`]
pub struct ResultQueue {
    rx: mpsc::Receiver<PluginResult>,
}

impl ResultQueue {
    pub fn try_recv(&self) -> Option<PluginResult> {
        self.rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<PluginResult> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Results already queued, without blocking
    pub fn try_iter(&self) -> TryIter<'_, PluginResult> {
        self.rx.try_iter()
    }

    /// Wait for the command's final result, skipping `keep_callback` events
    ///
    /// `timeout` bounds the whole wait, not each event.
    pub fn recv_final(&self, timeout: Duration) -> Option<PluginResult> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(result) if result.is_final() => return Some(result),
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Collect results until a final one arrives or nothing comes for `idle`
    ///
    /// The final result, if any, is the last element.
    pub fn drain(&self, idle: Duration) -> Vec<PluginResult> {
        let mut collected = Vec::new();
        while let Ok(result) = self.rx.recv_timeout(idle) {
            let done = result.is_final();
            collected.push(result);
            if done {
                break;
            }
        }
        collected
    }
}
