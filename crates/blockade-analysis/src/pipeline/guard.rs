//! Run one algorithm on a worker thread under a deadline.
//!
//! The worker gets a child [`CancelToken`]; the caller waits on a channel in
//! short slices so it can notice both the deadline and outer cancellation.
//! On timeout the child token fires and the worker is left to wind down on
//! its own. Its result, if it ever arrives, is dropped.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, warn};

use crate::cancel::CancelToken;

/// How often the caller re-checks cancellation while waiting.
const POLL_SLICE: Duration = Duration::from_millis(10);

/// What happened to a guarded computation.
#[derive(Debug)]
pub enum Guarded<T> {
    Completed { value: T, elapsed: Duration },
    TimedOut { elapsed: Duration },
    /// The worker panicked or could not be started.
    Faulted { message: String, elapsed: Duration },
    /// The outer token fired; the caller should stop.
    Cancelled,
}

/// Run `work` on a named worker thread, giving up after `timeout`.
///
/// A timeout too large to add to the current instant means no deadline.
pub fn run_guarded<T, F>(name: &'static str, timeout: Duration, cancel: &CancelToken, work: F) -> Guarded<T>
where
    T: Send + 'static,
    F: FnOnce(&CancelToken) -> T + Send + 'static,
{
    let started = Instant::now();
    let deadline = started.checked_add(timeout);
    let child = cancel.child();
    let (tx, rx) = mpsc::sync_channel::<Result<T, String>>(1);

    let worker_token = child.clone();
    let spawned = thread::Builder::new()
        .name(format!("phase2-{name}"))
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&worker_token)))
                .map_err(|payload| panic_message(payload.as_ref()));
            // The receiver is gone after a timeout; nothing to report.
            let _ = tx.send(outcome);
        });

    if let Err(err) = spawned {
        warn!(metric = name, error = %err, "failed to spawn worker");
        return Guarded::Faulted {
            message: format!("failed to spawn worker: {err}"),
            elapsed: started.elapsed(),
        };
    }

    loop {
        if cancel.is_cancelled() {
            child.cancel();
            debug!(metric = name, "cancelled while waiting for worker");
            return Guarded::Cancelled;
        }

        let now = Instant::now();
        if deadline.is_some_and(|d| now >= d) {
            child.cancel();
            warn!(metric = name, timeout_ms = timeout.as_millis(), "metric timed out");
            return Guarded::TimedOut {
                elapsed: started.elapsed(),
            };
        }
        let slice = deadline.map_or(POLL_SLICE, |d| POLL_SLICE.min(d - now));

        match rx.recv_timeout(slice) {
            Ok(Ok(value)) => {
                return Guarded::Completed {
                    value,
                    elapsed: started.elapsed(),
                };
            }
            Ok(Err(message)) => {
                warn!(metric = name, %message, "metric worker panicked");
                return Guarded::Faulted {
                    message,
                    elapsed: started.elapsed(),
                };
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                return Guarded::Faulted {
                    message: "worker exited without a result".to_string(),
                    elapsed: started.elapsed(),
                };
            }
        }
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
