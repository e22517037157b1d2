//! Log replay on open
//!
//! Rebuilds the live key-value index from the log:
//! - Validate the file header
//! - Replay records in order (last write wins, removes delete)
//! - Cut off a torn final record left by a crash mid-append
//! - Skip records whose checksum fails, up to a configurable limit
//!
//! ## Key Principle
//!
//! After recovery the index reflects a prefix of the successfully appended
//! records, minus any corrupt records the options allowed skipping. A
//! partially written record is never visible.

use std::time::Instant;

use rollout_kv_core::{Error, Result};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::format::{decode_header, encode_header, LogRecord, RecordError, LOG_HEADER_SIZE};

// ============================================================================
// Recovery Options
// ============================================================================

/// Recovery options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryOptions {
    /// Maximum corrupt records to skip before failing the open
    pub max_corrupt_records: usize,
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        Self::strict()
    }
}

impl RecoveryOptions {
    /// Fail on any corrupt record.
    pub fn strict() -> Self {
        RecoveryOptions {
            max_corrupt_records: 0,
        }
    }

    /// Skip corrupt records, losing only the affected writes.
    pub fn permissive() -> Self {
        RecoveryOptions {
            max_corrupt_records: usize::MAX,
        }
    }
}

// ============================================================================
// Recovery Stats
// ============================================================================

/// What replay found.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Records applied to the index
    pub records_replayed: u64,
    /// Corrupt records skipped
    pub corrupt_records_skipped: u64,
    /// Bytes cut from the end of the log (torn write)
    pub bytes_truncated: u64,
    /// Live keys after replay
    pub live_keys: u64,
    /// Total replay time (microseconds)
    pub recovery_time_micros: u64,
}

impl RecoveryStats {
    /// Get human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Recovery complete: {} records, {} live keys, {} corrupt, {} bytes truncated, {:.2}ms",
            self.records_replayed,
            self.live_keys,
            self.corrupt_records_skipped,
            self.bytes_truncated,
            self.recovery_time_micros as f64 / 1000.0,
        )
    }

    /// Check if recovery had to discard anything.
    pub fn has_issues(&self) -> bool {
        self.corrupt_records_skipped > 0 || self.bytes_truncated > 0
    }
}

// ============================================================================
// Replay
// ============================================================================

/// Result of replaying a log buffer.
#[derive(Debug)]
pub struct Replayed {
    /// Live entries
    pub index: FxHashMap<String, String>,
    /// Length of the valid prefix; the file must be truncated to this
    pub valid_len: u64,
    /// Encoded size of the set records backing `index`
    pub live_bytes: u64,
    /// True when the file has no usable header and one must be written
    pub needs_header: bool,
    /// Replay statistics
    pub stats: RecoveryStats,
}

/// Replay a complete log file image.
pub fn replay(buf: &[u8], options: &RecoveryOptions) -> Result<Replayed> {
    let start = Instant::now();
    let mut stats = RecoveryStats::default();
    let mut index: FxHashMap<String, String> = FxHashMap::default();

    if buf.len() < LOG_HEADER_SIZE {
        // Empty, or a header torn during creation.
        if !encode_header().starts_with(buf) {
            return Err(Error::Corruption(format!(
                "log too short for header ({} bytes)",
                buf.len()
            )));
        }
        stats.bytes_truncated = buf.len() as u64;
        return Ok(Replayed {
            index,
            valid_len: 0,
            live_bytes: 0,
            needs_header: true,
            stats,
        });
    }

    decode_header(buf).map_err(|e| Error::Corruption(e.to_string()))?;

    let mut offset = LOG_HEADER_SIZE;
    while offset < buf.len() {
        match LogRecord::decode(&buf[offset..]) {
            Ok((record, used)) => {
                match record {
                    LogRecord::Set { key, value } => {
                        index.insert(key, value);
                    }
                    LogRecord::Remove { key } => {
                        index.remove(&key);
                    }
                }
                stats.records_replayed += 1;
                offset += used;
            }
            // Frames verify before their length is trusted, so a short
            // record can only be the last one.
            Err(RecordError::Incomplete { needed, have }) => {
                warn!(
                    offset,
                    needed, have, "Torn record at end of log, truncating"
                );
                break;
            }
            Err(e) => {
                stats.corrupt_records_skipped += 1;
                check_corrupt_limit(&stats, options, offset, &e)?;
                match e.record_len() {
                    Some(record_len) => {
                        warn!(offset, error = %e, "Skipping corrupt record");
                        offset += record_len;
                    }
                    None => {
                        // Frame cannot be trusted, so nothing after it can be located.
                        warn!(offset, error = %e, "Unreadable frame, discarding rest of log");
                        break;
                    }
                }
            }
        }
    }

    let valid_len = offset as u64;
    stats.bytes_truncated = buf.len() as u64 - valid_len;
    stats.live_keys = index.len() as u64;
    stats.recovery_time_micros = start.elapsed().as_micros() as u64;

    let live_bytes = index
        .iter()
        .map(|(k, v)| LogRecord::set_len(k, v) as u64)
        .sum();

    debug!("{}", stats.summary());

    Ok(Replayed {
        index,
        valid_len,
        live_bytes,
        needs_header: false,
        stats,
    })
}

fn check_corrupt_limit(
    stats: &RecoveryStats,
    options: &RecoveryOptions,
    offset: usize,
    error: &RecordError,
) -> Result<()> {
    if stats.corrupt_records_skipped > options.max_corrupt_records as u64 {
        return Err(Error::Corruption(format!(
            "too many corrupt records ({} > {}): at offset {}: {}",
            stats.corrupt_records_skipped, options.max_corrupt_records, offset, error
        )));
    }
    Ok(())
}
