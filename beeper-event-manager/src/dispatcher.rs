//! Thread-affinity dispatcher
//!
//! The single place that decides where a piece of bridge work runs:
//!
//! - `run_on_ui` / `run_on_ui_blocking`: on the UI worker thread, in
//!   submission order. Called from the UI thread itself, the job runs inline.
//! - `run_in_background`: on a fresh named thread, for calls that may block
//!   for a long time (token application).

use std::sync::mpsc;
use std::thread::{JoinHandle, ThreadId};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{EventManagerError, Result};
use crate::worker::{spawn_background, spawn_ui_worker, Command};

/// Schedules work on the UI thread or on background threads
pub struct Dispatcher {
    /// Send jobs to the UI worker
    command_tx: mpsc::Sender<Command>,

    /// Thread the UI worker runs on
    ui_thread: ThreadId,

    /// Name given to background threads
    background_name: String,

    /// How long `run_on_ui_blocking` waits for a result
    call_timeout: Duration,

    /// UI worker handle, taken on shutdown
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Spawn the UI worker and return a dispatcher for it
    pub fn new(
        ui_thread_name: &str,
        background_name: &str,
        call_timeout: Duration,
    ) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel();
        let worker = spawn_ui_worker(ui_thread_name, command_rx)?;
        let ui_thread = worker.thread().id();

        tracing::debug!("Dispatcher ready, UI thread '{}'", ui_thread_name);

        Ok(Self {
            command_tx,
            ui_thread,
            background_name: background_name.to_string(),
            call_timeout,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Whether the caller is running on the UI thread
    pub fn is_ui_thread(&self) -> bool {
        std::thread::current().id() == self.ui_thread
    }

    /// Run `job` on the UI thread without waiting for it
    pub fn run_on_ui<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_ui_thread() {
            job();
            return Ok(());
        }

        self.command_tx
            .send(Command::Run(Box::new(job)))
            .map_err(|_| EventManagerError::DispatcherDisconnected)
    }

    /// Run `job` on the UI thread and wait for its result
    ///
    /// Waits at most the configured call timeout. A job that times out still
    /// runs later; only its result is discarded.
    pub fn run_on_ui_blocking<F, R>(&self, job: F) -> Result<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_ui_thread() {
            return Ok(job());
        }

        let (result_tx, result_rx) = mpsc::sync_channel(1);
        self.command_tx
            .send(Command::Run(Box::new(move || {
                let _ = result_tx.send(job());
            })))
            .map_err(|_| EventManagerError::DispatcherDisconnected)?;

        match result_rx.recv_timeout(self.call_timeout) {
            Ok(value) => Ok(value),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!("UI call timed out after {:?}", self.call_timeout);
                Err(EventManagerError::Timeout(self.call_timeout))
            }
            // The job was dropped without sending: it panicked, or the worker
            // shut down before reaching it.
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EventManagerError::JobPanicked),
        }
    }

    /// Run `job` on a dedicated background thread
    pub fn run_in_background<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = spawn_background(&self.background_name, job)?;
        tracing::trace!("Spawned background job on {:?}", handle.thread().id());
        Ok(())
    }

    /// Wait until every job queued before this call has run
    pub fn flush(&self) -> Result<()> {
        self.run_on_ui_blocking(|| ())
    }

    /// Stop the UI worker after the jobs already queued
    ///
    /// Joins the worker unless called from the UI thread itself.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(Command::Shutdown);

        if self.is_ui_thread() {
            return;
        }
        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                tracing::error!("UI worker terminated abnormally");
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        tracing::debug!("Dispatcher dropping, shutting down UI worker");
        let _ = self.command_tx.send(Command::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new("test-ui", "test-bg", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_jobs_run_on_ui_thread_in_order() {
        let dispatcher = Arc::new(dispatcher());
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..10 {
            let order = Arc::clone(&order);
            let d = Arc::clone(&dispatcher);
            dispatcher
                .run_on_ui(move || {
                    assert!(d.is_ui_thread());
                    order.lock().push(i);
                })
                .unwrap();
        }
        dispatcher.flush().unwrap();

        assert_eq!(*order.lock(), (0..10).collect::<Vec<_>>());
        assert!(!dispatcher.is_ui_thread());
    }

    #[test]
    fn test_blocking_call_returns_value() {
        let dispatcher = dispatcher();
        let name = dispatcher
            .run_on_ui_blocking(|| std::thread::current().name().map(str::to_owned))
            .unwrap();
        assert_eq!(name.as_deref(), Some("test-ui"));
    }

    #[test]
    fn test_nested_call_runs_inline() {
        let dispatcher = Arc::new(dispatcher());
        let d = Arc::clone(&dispatcher);

        let value = dispatcher
            .run_on_ui_blocking(move || d.run_on_ui_blocking(|| 7).unwrap())
            .unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_panicking_job_reports_error() {
        let dispatcher = dispatcher();
        let result: Result<()> = dispatcher.run_on_ui_blocking(|| panic!("boom"));
        assert!(matches!(result, Err(EventManagerError::JobPanicked)));

        // The worker keeps going.
        assert_eq!(dispatcher.run_on_ui_blocking(|| 1).unwrap(), 1);
    }

    #[test]
    fn test_timeout() {
        let dispatcher = Dispatcher::new("test-ui", "test-bg", Duration::from_millis(20)).unwrap();
        let result = dispatcher.run_on_ui_blocking(|| std::thread::sleep(Duration::from_millis(200)));
        assert!(matches!(result, Err(EventManagerError::Timeout(_))));
    }

    #[test]
    fn test_background_runs_off_ui_thread() {
        let dispatcher = dispatcher();
        let (tx, rx) = mpsc::channel();

        dispatcher
            .run_in_background(move || {
                tx.send(std::thread::current().name().map(str::to_owned)).unwrap();
            })
            .unwrap();

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("test-bg"));
    }

    #[test]
    fn test_shutdown_rejects_new_jobs() {
        let dispatcher = dispatcher();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        dispatcher
            .run_on_ui(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        dispatcher.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(matches!(
            dispatcher.run_on_ui(|| {}),
            Err(EventManagerError::DispatcherDisconnected)
        ));
    }
}
