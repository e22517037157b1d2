//! File-backed store
//!
//! Every mutation is appended to a single log file before the in-memory
//! index is updated. Reads are served from the index. On open, the log is
//! replayed to rebuild the index (see [`crate::recovery`]).
//!
//! The log only grows on writes, so it is compacted by rewriting the live
//! entries to a side file and renaming it over the log once enough of the
//! file is stale (overwritten or removed entries).
//!
//! In batched mode a background [`Flusher`] syncs writes still pending once
//! per interval, so a lone write reaches disk without waiting for the next.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use fs2::FileExt;
use parking_lot::Mutex;
use rollout_kv_core::{validate_entry, Error, KeyValueStore, Result};
use rustc_hash::FxHashMap;
use tracing::{debug, info, trace, warn};

use crate::format::{encode_header, LogRecord, LOG_HEADER_SIZE};
use crate::recovery::{replay, RecoveryOptions, RecoveryStats};
use crate::wal::{DurabilityMode, Flusher, LogWriter};

/// Name of the log file inside the store directory.
pub const LOG_FILE_NAME: &str = "rollout.log";

/// Options for [`FileStore::open`].
#[derive(Debug, Clone, PartialEq)]
pub struct FileStoreOptions {
    /// When appended records are fsynced
    pub durability: DurabilityMode,
    /// How replay treats corrupt records
    pub recovery: RecoveryOptions,
    /// Compact when stale bytes reach this fraction of the log
    pub compaction_ratio: f64,
    /// Never auto-compact while fewer than this many bytes are stale
    pub compaction_min_bytes: u64,
}

impl Default for FileStoreOptions {
    fn default() -> Self {
        Self {
            durability: DurabilityMode::default(),
            recovery: RecoveryOptions::default(),
            compaction_ratio: 0.5,
            compaction_min_bytes: 1024 * 1024,
        }
    }
}

/// Outcome of a compaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompactionStats {
    /// Log size before compaction
    pub bytes_before: u64,
    /// Log size after compaction
    pub bytes_after: u64,
    /// Entries rewritten
    pub live_keys: u64,
}

struct Inner {
    index: FxHashMap<String, String>,
    /// None once the store is closed
    writer: Option<LogWriter>,
    /// Encoded size of the set records backing `index`
    live_bytes: u64,
    lock: Option<LockFile>,
}

impl Inner {
    fn writer_mut(&mut self) -> Result<&mut LogWriter> {
        self.writer.as_mut().ok_or(Error::Closed)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.writer.is_none() {
            return Err(Error::Closed);
        }
        Ok(())
    }

    fn stale_bytes(&self) -> u64 {
        let len = self.writer.as_ref().map(LogWriter::len).unwrap_or(0);
        len.saturating_sub(LOG_HEADER_SIZE as u64 + self.live_bytes)
    }
}

/// Persistent key-value store backed by an append-only log.
///
/// # Example
///
/// ```ignore
/// use rollout_kv_storage::{FileStore, FileStoreOptions};
///
/// let store = FileStore::open("./rollout-data", FileStoreOptions::default())?;
/// store.set("rollout:percent", "25")?;
/// store.close()?;
/// ```
pub struct FileStore {
    dir: PathBuf,
    log_path: PathBuf,
    options: FileStoreOptions,
    recovery: RecoveryStats,
    inner: Arc<Mutex<Inner>>,
    /// Running in batched mode until close
    flusher: Mutex<Option<Flusher>>,
}

impl FileStore {
    /// Open (or create) the store in directory `dir`.
    ///
    /// Takes an exclusive lock on the log, replays it, and truncates any
    /// torn tail left by a crash. The lock is an OS advisory lock, released
    /// by the kernel if the process dies.
    pub fn open(dir: impl AsRef<Path>, options: FileStoreOptions) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let log_path = dir.join(LOG_FILE_NAME);
        let lock = LockFile::acquire(lock_path(&log_path))?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&log_path)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        let replayed = replay(&buf, &options.recovery)?;
        if replayed.needs_header {
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&encode_header())?;
            file.sync_all()?;
            sync_dir(&dir)?;
            debug!(path = %log_path.display(), "Initialized new log");
        } else if replayed.valid_len < buf.len() as u64 {
            file.set_len(replayed.valid_len)?;
            file.sync_all()?;
        }
        drop(file);

        info!(path = %log_path.display(), "{}", replayed.stats.summary());

        let store = Self {
            dir,
            log_path,
            recovery: replayed.stats,
            inner: Arc::new(Mutex::new(Inner {
                index: replayed.index,
                writer: None,
                live_bytes: replayed.live_bytes,
                lock: Some(lock),
            })),
            flusher: Mutex::new(None),
            options,
        };
        store.inner.lock().writer = Some(store.open_writer()?);

        if let DurabilityMode::Batched { interval_ms, .. } = store.options.durability {
            let flusher = spawn_flusher(
                Arc::downgrade(&store.inner),
                Duration::from_millis(interval_ms),
            )?;
            *store.flusher.lock() = Some(flusher);
        }
        Ok(store)
    }

    /// Open with default options.
    pub fn open_default(dir: impl AsRef<Path>) -> Result<Self> {
        Self::open(dir, FileStoreOptions::default())
    }

    /// Store directory.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Log file path.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Durability mode in effect.
    pub fn durability_mode(&self) -> DurabilityMode {
        self.options.durability
    }

    /// What replay found when the store was opened.
    pub fn recovery_stats(&self) -> &RecoveryStats {
        &self.recovery
    }

    /// Current log size in bytes.
    pub fn log_len(&self) -> u64 {
        self.inner.lock().writer.as_ref().map(LogWriter::len).unwrap_or(0)
    }

    /// Bytes of the log occupied by overwritten or removed entries.
    pub fn stale_bytes(&self) -> u64 {
        self.inner.lock().stale_bytes()
    }

    /// Rewrite the log to contain only live entries.
    pub fn compact(&self) -> Result<CompactionStats> {
        let mut inner = self.inner.lock();
        self.compact_locked(&mut inner)
    }

    /// Flush pending writes and release the log.
    ///
    /// Every later operation fails with [`Error::Closed`]. Closing twice is
    /// a no-op.
    pub fn close(&self) -> Result<()> {
        // Joined before taking the index lock, which the flusher also takes.
        drop(self.flusher.lock().take());

        let mut inner = self.inner.lock();
        if let Some(mut writer) = inner.writer.take() {
            writer.flush()?;
            debug!(path = %self.log_path.display(), "FileStore closed");
        }
        inner.lock = None;
        Ok(())
    }

    fn open_writer(&self) -> Result<LogWriter> {
        let file = OpenOptions::new().append(true).open(&self.log_path)?;
        let len = file.metadata()?.len();
        Ok(LogWriter::new(file, len, self.options.durability))
    }

    fn compact_path(&self) -> PathBuf {
        self.log_path.with_extension("log.compact")
    }

    fn maybe_compact(&self, inner: &mut Inner) {
        let stale = inner.stale_bytes();
        if stale < self.options.compaction_min_bytes {
            return;
        }
        let total = inner.writer.as_ref().map(LogWriter::len).unwrap_or(0);
        if (stale as f64) < self.options.compaction_ratio * total as f64 {
            return;
        }
        // The triggering write is already durable per the mode; a failed
        // compaction only leaves the log larger than it needs to be.
        if let Err(e) = self.compact_locked(inner) {
            warn!(error = %e, "Automatic compaction failed");
        }
    }

    fn compact_locked(&self, inner: &mut Inner) -> Result<CompactionStats> {
        let writer = inner.writer_mut()?;
        writer.flush()?;
        let bytes_before = writer.len();

        let tmp_path = self.compact_path();
        write_live_log(&tmp_path, &inner.index)?;

        // Release the old handle before replacing the file it points at.
        inner.writer = None;
        let renamed = fs::rename(&tmp_path, &self.log_path).and_then(|_| sync_dir(&self.dir));
        inner.writer = Some(self.open_writer()?);
        renamed?;

        let stats = CompactionStats {
            bytes_before,
            bytes_after: inner.writer.as_ref().map(LogWriter::len).unwrap_or(0),
            live_keys: inner.index.len() as u64,
        };
        info!(
            bytes_before = stats.bytes_before,
            bytes_after = stats.bytes_after,
            live_keys = stats.live_keys,
            "Log compacted"
        );
        Ok(stats)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let inner = self.inner.lock();
        inner.ensure_open()?;
        trace!(key, "FileStore get");
        Ok(inner.index.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_entry(key, value)?;
        let record = LogRecord::Set {
            key: key.to_string(),
            value: value.to_string(),
        };

        let mut inner = self.inner.lock();
        let appended = inner.writer_mut()?.append(&record)?;
        trace!(key, bytes = appended, "FileStore set");

        if let Some(old) = inner.index.insert(key.to_string(), value.to_string()) {
            inner.live_bytes -= LogRecord::set_len(key, &old) as u64;
        }
        inner.live_bytes += appended;

        self.maybe_compact(&mut inner);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        if !inner.index.contains_key(key) {
            return Ok(false);
        }

        let record = LogRecord::Remove {
            key: key.to_string(),
        };
        inner.writer_mut()?.append(&record)?;
        trace!(key, "FileStore remove");

        if let Some(old) = inner.index.remove(key) {
            inner.live_bytes -= LogRecord::set_len(key, &old) as u64;
        }

        self.maybe_compact(&mut inner);
        Ok(true)
    }

    fn contains(&self, key: &str) -> Result<bool> {
        let inner = self.inner.lock();
        inner.ensure_open()?;
        Ok(inner.index.contains_key(key))
    }

    fn keys(&self) -> Result<Vec<String>> {
        let inner = self.inner.lock();
        inner.ensure_open()?;
        let mut keys: Vec<String> = inner.index.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn len(&self) -> Result<usize> {
        let inner = self.inner.lock();
        inner.ensure_open()?;
        Ok(inner.index.len())
    }

    fn flush(&self) -> Result<()> {
        self.inner.lock().writer_mut()?.flush()
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        drop(self.flusher.get_mut().take());
        if let Some(writer) = self.inner.lock().writer.as_mut() {
            if let Err(e) = writer.flush() {
                warn!(error = %e, path = %self.log_path.display(), "Failed to flush log on drop");
            }
        }
    }
}

/// Write a fresh log holding one set record per live entry, sorted by key.
fn write_live_log(path: &Path, index: &FxHashMap<String, String>) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(&encode_header())?;

    let mut keys: Vec<&String> = index.keys().collect();
    keys.sort();
    for key in keys {
        let record = LogRecord::Set {
            key: key.clone(),
            value: index[key].clone(),
        };
        out.write_all(&record.encode())?;
    }

    let file = out.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    file.sync_all()?;
    Ok(())
}

/// Sync pending batched writes once per `interval` until the store closes.
fn spawn_flusher(shared: Weak<Mutex<Inner>>, interval: Duration) -> Result<Flusher> {
    let flusher = Flusher::spawn(interval, move || {
        let Some(state) = shared.upgrade() else {
            return false;
        };
        let mut inner = state.lock();
        let Some(writer) = inner.writer.as_mut() else {
            return false;
        };
        match writer.sync_pending() {
            Ok(true) => trace!("Background sync"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Background log sync failed"),
        }
        true
    })?;
    Ok(flusher)
}

fn lock_path(log_path: &Path) -> PathBuf {
    log_path.with_extension("log.lock")
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

// ============================================================================
// Lock File
// ============================================================================

/// Exclusive ownership of a log, held for the lifetime of the store.
///
/// An advisory lock on `<log>.lock`. The file itself is left in place; only
/// the lock matters, and the OS drops it with the process.
struct LockFile {
    file: File,
    path: PathBuf,
}

impl LockFile {
    fn acquire(path: PathBuf) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                return Err(Error::Storage(format!(
                    "log is locked by another process ({})",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        }

        // Holder's pid, for whoever finds the store locked.
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        trace!(path = %path.display(), "Lock acquired");
        Ok(Self { file, path })
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            debug!(error = %e, path = %self.path.display(), "Failed to release lock");
        }
    }
}
