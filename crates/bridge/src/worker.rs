//! Serial worker applying bridge calls to the store.
//!
//! One dedicated thread owns the receiving end of the command channel and
//! applies commands in the order they were sent. Store calls are blocking
//! I/O, so they never run on the caller's async executor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rollout_kv_core::KeyValueStore;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::error::{BridgeError, Result};

/// Commands sent from [`crate::RolloutStorage`] handles to the worker.
pub(crate) enum Command {
    Set {
        key: String,
        value: String,
    },
    Remove {
        key: String,
    },
    Get {
        key: String,
        reply: oneshot::Sender<Result<Option<String>>>,
    },
    /// Barrier: replied to once everything sent before it has been applied
    Sync {
        reply: oneshot::Sender<()>,
    },
    /// Flush the store and stop; commands queued behind it are refused
    Shutdown {
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Counters shared between handles and the worker.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub writes: AtomicU64,
    pub removes: AtomicU64,
    pub reads: AtomicU64,
    pub failures: AtomicU64,
}

impl Counters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

pub(crate) struct Worker {
    rx: mpsc::UnboundedReceiver<Command>,
    store: Arc<dyn KeyValueStore>,
    counters: Arc<Counters>,
}

impl Worker {
    pub(crate) fn new(
        rx: mpsc::UnboundedReceiver<Command>,
        store: Arc<dyn KeyValueStore>,
        counters: Arc<Counters>,
    ) -> Self {
        Self {
            rx,
            store,
            counters,
        }
    }

    /// Run until shutdown or until every handle is dropped.
    pub(crate) fn run(mut self) {
        debug!("RolloutStorage worker started");

        while let Some(command) = self.rx.blocking_recv() {
            match command {
                Command::Set { key, value } => self.apply_set(&key, &value),
                Command::Remove { key } => self.apply_remove(&key),
                Command::Get { key, reply } => {
                    Counters::bump(&self.counters.reads);
                    trace!(key = %key, "getItem");
                    let result = self.store.get(&key).map_err(Into::into);
                    // Caller may have stopped waiting; the read still counts.
                    let _ = reply.send(result);
                }
                Command::Sync { reply } => {
                    let _ = reply.send(());
                }
                Command::Shutdown { reply } => {
                    // Refuse new sends before acknowledging.
                    self.rx.close();
                    self.refuse_queued();
                    let result = self.store.flush().map_err(Into::into);
                    let _ = reply.send(result);
                    debug!("RolloutStorage worker shut down");
                    return;
                }
            }
        }

        if let Err(e) = self.store.flush() {
            warn!(error = %e, "Flush failed after all handles were dropped");
        }
        debug!("RolloutStorage worker stopped: all handles dropped");
    }

    /// Answer everything that was already queued behind a shutdown.
    fn refuse_queued(&mut self) {
        while let Ok(command) = self.rx.try_recv() {
            match command {
                Command::Set { key, .. } => {
                    Counters::bump(&self.counters.failures);
                    warn!(key = %key, "setItem queued behind shutdown, dropping");
                }
                Command::Remove { key } => {
                    Counters::bump(&self.counters.failures);
                    warn!(key = %key, "removeItem queued behind shutdown, dropping");
                }
                Command::Get { reply, .. } => {
                    let _ = reply.send(Err(BridgeError::Shutdown));
                }
                // Both callers see the closed reply as a shutdown.
                Command::Sync { .. } | Command::Shutdown { .. } => {}
            }
        }
    }

    fn apply_set(&self, key: &str, value: &str) {
        trace!(key, "setItem");
        match self.store.set(key, value) {
            Ok(()) => Counters::bump(&self.counters.writes),
            Err(e) => {
                Counters::bump(&self.counters.failures);
                warn!(key, error = %e, "setItem failed");
            }
        }
    }

    fn apply_remove(&self, key: &str) {
        trace!(key, "removeItem");
        match self.store.remove(key) {
            Ok(_) => Counters::bump(&self.counters.removes),
            Err(e) => {
                Counters::bump(&self.counters.failures);
                warn!(key, error = %e, "removeItem failed");
            }
        }
    }
}
