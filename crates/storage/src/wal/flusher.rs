//! Background sync for batched logs.
//!
//! `Batched` mode checks its bounds on each append, so a write followed by
//! silence would stay buffered indefinitely. The flusher ticks once per
//! interval and syncs whatever is still pending.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

/// Handle to a running flusher thread. Dropping it stops and joins the
/// thread.
pub struct Flusher {
    stop: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Flusher {
    /// Spawn a thread that calls `tick` every `interval` until `tick`
    /// returns `false` or the handle is dropped.
    pub fn spawn<F>(interval: Duration, mut tick: F) -> std::io::Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let interval = interval.max(Duration::from_millis(1));
        let (stop, stopped) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("rollout-kv-flusher".to_string())
            .spawn(move || {
                debug!(interval_ms = interval.as_millis() as u64, "Log flusher started");
                loop {
                    match stopped.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if !tick() {
                                break;
                            }
                        }
                        // Stop requested, or the handle is gone.
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("Log flusher stopped");
            })?;

        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }
}

impl Drop for Flusher {
    fn drop(&mut self) {
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                debug!("Log flusher panicked");
            }
        }
    }
}
