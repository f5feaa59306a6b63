//! Worker threads behind the dispatcher
//!
//! The UI worker is a single long-lived thread draining a job queue in FIFO
//! order. Every UI-affine call of the bridge runs there, which serializes
//! scanner acquisition and registry mutation without extra locking.
//!
//! Token application uses short-lived background threads that drive one
//! future each on their own current-thread tokio runtime.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use crate::error::{EventManagerError, Result};

/// A unit of work for the UI thread
pub(crate) type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// Commands sent from the dispatcher to the UI worker
pub(crate) enum Command {
    /// Run a job on the UI thread
    Run(UiJob),
    /// Stop the worker after the jobs already queued
    Shutdown,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Run(_) => f.write_str("Run"),
            Command::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Spawns the UI worker thread
pub(crate) fn spawn_ui_worker(
    name: &str,
    command_rx: mpsc::Receiver<Command>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || run_ui_loop(command_rx))
        .map_err(|source| EventManagerError::WorkerSpawn {
            name: name.to_string(),
            source,
        })
}

fn run_ui_loop(command_rx: mpsc::Receiver<Command>) {
    tracing::info!("UI worker started");

    while let Ok(command) = command_rx.recv() {
        match command {
            Command::Run(job) => {
                // A panicking job must not take the UI thread down with it.
                if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    tracing::error!("UI job panicked, continuing with next job");
                }
            }
            Command::Shutdown => {
                tracing::info!("UI worker received shutdown command");
                break;
            }
        }
    }

    tracing::info!("UI worker shut down");
}

/// Spawns a named background thread running `job`
pub(crate) fn spawn_background<F>(name: &str, job: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(job)
        .map_err(|source| EventManagerError::WorkerSpawn {
            name: name.to_string(),
            source,
        })
}

/// Drive `future` to completion on a fresh current-thread runtime
///
/// Must be called from a thread that is not already inside a tokio runtime.
pub fn block_on_worker<F>(future: F) -> Result<F::Output>
where
    F: Future,
{
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(EventManagerError::Runtime)?;

    Ok(rt.block_on(future))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_debug() {
        let cmd = Command::Run(Box::new(|| {}));
        assert_eq!(format!("{:?}", cmd), "Run");
        assert_eq!(format!("{:?}", Command::Shutdown), "Shutdown");
    }

    #[test]
    fn test_ui_loop_survives_panicking_job() {
        let (tx, rx) = mpsc::channel();
        let worker = spawn_ui_worker("test-ui", rx).unwrap();
        let (done_tx, done_rx) = mpsc::channel();

        tx.send(Command::Run(Box::new(|| panic!("boom")))).unwrap();
        tx.send(Command::Run(Box::new(move || done_tx.send(()).unwrap())))
            .unwrap();
        tx.send(Command::Shutdown).unwrap();

        assert!(done_rx.recv().is_ok());
        worker.join().unwrap();
    }

    #[test]
    fn test_block_on_worker() {
        let value = spawn_background("test-bg", || {
            let out = block_on_worker(async { 21 * 2 }).unwrap();
            assert_eq!(out, 42);
        })
        .unwrap();
        value.join().unwrap();
    }
}
