//! Append-only log writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

use rollout_kv_core::Result;
use tracing::trace;

use super::durability::DurabilityMode;
use crate::format::LogRecord;

/// Appends encoded records to an open log file and applies the fsync policy.
pub struct LogWriter {
    out: BufWriter<File>,
    mode: DurabilityMode,
    /// Writes appended since the last fsync
    pending: usize,
    last_sync: Instant,
    /// Current file length including buffered bytes
    len: u64,
}

impl LogWriter {
    /// Wrap a file opened for appending whose current length is `len`.
    pub fn new(file: File, len: u64, mode: DurabilityMode) -> Self {
        Self {
            out: BufWriter::new(file),
            mode,
            pending: 0,
            last_sync: Instant::now(),
            len,
        }
    }

    /// Append one record, syncing if the durability mode says so.
    ///
    /// Returns the number of bytes appended.
    pub fn append(&mut self, record: &LogRecord) -> Result<u64> {
        let bytes = record.encode();
        self.out.write_all(&bytes)?;
        self.len += bytes.len() as u64;
        self.pending += 1;

        if self.mode.should_sync(self.pending, self.last_sync.elapsed()) {
            self.sync()?;
        }
        Ok(bytes.len() as u64)
    }

    /// Push buffered bytes to the OS and fsync if the mode ever fsyncs.
    pub fn flush(&mut self) -> Result<()> {
        if self.mode.requires_fsync() {
            self.sync()
        } else {
            self.out.flush()?;
            self.pending = 0;
            Ok(())
        }
    }

    /// Push buffered bytes to the OS and fsync unconditionally.
    pub fn sync(&mut self) -> Result<()> {
        self.out.flush()?;
        self.out.get_ref().sync_data()?;
        trace!(pending = self.pending, len = self.len, "log synced");
        self.pending = 0;
        self.last_sync = Instant::now();
        Ok(())
    }

    /// Sync if any write is still waiting for one. Returns whether it synced.
    pub fn sync_pending(&mut self) -> Result<bool> {
        if self.pending == 0 || !self.mode.requires_fsync() {
            return Ok(false);
        }
        self.sync()?;
        Ok(true)
    }

    /// Current log length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Check if nothing has been written (not even a header).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Writes not yet fsynced.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Durability mode in effect.
    pub fn mode(&self) -> DurabilityMode {
        self.mode
    }
}
