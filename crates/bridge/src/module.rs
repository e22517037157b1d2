//! Typed interface of the bridge module.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use rollout_kv_core::KeyValueStore;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::descriptor::{Method, MODULE_NAME};
use crate::error::{BridgeError, Result};
use crate::worker::{Command, Counters, Worker};

/// Snapshot of the module's operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BridgeStats {
    /// `setItem` calls applied to the store
    pub writes: u64,
    /// `removeItem` calls applied to the store (including no-ops)
    pub removes: u64,
    /// `getItem` calls served
    pub reads: u64,
    /// Fire-and-forget calls that failed or were dropped after shutdown
    pub failures: u64,
}

/// The RolloutStorage bridge module.
///
/// Handles are cheap to clone and all clones feed the same worker, so calls
/// from every clone are applied in one FIFO order. A `set_item(k, v)`
/// followed by `get_item(k)` through the same module observes `v`.
///
/// The worker stops when [`shutdown`](Self::shutdown) is called or when the
/// last handle is dropped.
#[derive(Clone)]
pub struct RolloutStorage {
    tx: mpsc::UnboundedSender<Command>,
    pub(crate) counters: Arc<Counters>,
}

impl RolloutStorage {
    /// Start a module forwarding to `store`.
    ///
    /// Spawns the worker thread. Does not require an async runtime; the
    /// returned futures can be awaited on any executor.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        let worker = Worker::new(rx, store, Arc::clone(&counters));

        std::thread::Builder::new()
            .name(format!("{}-worker", MODULE_NAME))
            .spawn(move || worker.run())
            .map_err(BridgeError::Spawn)?;

        Ok(Self { tx, counters })
    }

    // =========================================================================
    // Exported methods
    // =========================================================================

    /// Write `value` under `key`, overwriting any prior value.
    ///
    /// Fire-and-forget: returns once the write is queued. Store failures
    /// are logged and counted in [`BridgeStats::failures`], never returned.
    pub fn set_item(&self, key: impl Into<String>, value: impl Into<String>) {
        self.submit(
            Method::SetItem,
            Command::Set {
                key: key.into(),
                value: value.into(),
            },
        );
    }

    /// Look up `key`.
    ///
    /// Resolves to `Some(value)` if present and `None` if absent. Absence is
    /// not an error; the call rejects only when the store fails or the
    /// module has shut down.
    pub async fn get_item(&self, key: impl Into<String>) -> Result<Option<String>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Get {
                key: key.into(),
                reply,
            })
            .map_err(|_| BridgeError::Shutdown)?;
        rx.await.map_err(|_| BridgeError::Shutdown)?
    }

    /// Delete `key` if present; no-op if absent.
    ///
    /// Fire-and-forget like [`set_item`](Self::set_item).
    pub fn remove_item(&self, key: impl Into<String>) {
        self.submit(Method::RemoveItem, Command::Remove { key: key.into() });
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Wait until every call queued before this one has been applied.
    pub async fn sync(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Sync { reply })
            .map_err(|_| BridgeError::Shutdown)?;
        rx.await.map_err(|_| BridgeError::Shutdown)
    }

    /// Apply everything queued so far, flush the store and stop the worker.
    ///
    /// Later `get_item` calls reject with [`BridgeError::Shutdown`]; later
    /// fire-and-forget calls, including any another clone queued behind the
    /// shutdown, are dropped and counted as failures.
    pub async fn shutdown(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Shutdown { reply })
            .map_err(|_| BridgeError::Shutdown)?;
        rx.await.map_err(|_| BridgeError::Shutdown)?
    }

    /// Check if the worker has stopped.
    pub fn is_shut_down(&self) -> bool {
        self.tx.is_closed()
    }

    /// Current operation counters.
    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            writes: self.counters.writes.load(Ordering::Relaxed),
            removes: self.counters.removes.load(Ordering::Relaxed),
            reads: self.counters.reads.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    fn submit(&self, method: Method, command: Command) {
        if self.tx.send(command).is_err() {
            Counters::bump(&self.counters.failures);
            warn!(method = %method, "{} has shut down, dropping call", MODULE_NAME);
        }
    }
}
