//! Durability mode for log writes.
//!
//! Defines when appended records are fsynced to disk.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Durability mode for log writes.
///
/// Controls when data is fsynced to disk and the trade-off between
/// write latency and how much can be lost on power failure.
///
/// # Mode Comparison
///
/// | Mode | fsync | Loss window on power failure |
/// |------|-------|------------------------------|
/// | None | never | everything since the OS last wrote back |
/// | Batched | every N writes or T ms | up to N writes / T ms |
/// | Strict | every write | nothing acknowledged |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityMode {
    /// Never fsync.
    ///
    /// Records still reach the log (on flush, close or drop) and survive a
    /// clean process exit, but not a crash of the machine.
    None,

    /// fsync after every write (slow, maximum durability).
    Strict,

    /// fsync every N writes OR every T milliseconds.
    ///
    /// May lose up to batch_size writes or interval_ms of data on crash.
    Batched {
        /// Maximum time between fsyncs in milliseconds
        interval_ms: u64,
        /// Maximum writes between fsyncs
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// Check if this mode ever fsyncs.
    pub fn requires_fsync(&self) -> bool {
        !matches!(self, DurabilityMode::None)
    }

    /// Check if this mode requires immediate fsync on every write.
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Strict)
    }

    /// Human-readable description of the mode.
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::None => "No fsync (fastest, recent writes lost on power failure)",
            DurabilityMode::Strict => "Sync fsync (safest, slowest)",
            DurabilityMode::Batched { .. } => "Batched fsync (balanced speed/safety)",
        }
    }

    /// Create a buffered mode with recommended defaults.
    ///
    /// Returns `Batched { interval_ms: 100, batch_size: 1000 }`.
    pub fn buffered_default() -> Self {
        DurabilityMode::Batched {
            interval_ms: 100,
            batch_size: 1000,
        }
    }

    /// Returns true if a batched writer with `pending` unsynced writes and
    /// `since_sync` elapsed since the last fsync should sync now.
    pub fn should_sync(&self, pending: usize, since_sync: Duration) -> bool {
        match *self {
            DurabilityMode::None => false,
            DurabilityMode::Strict => pending > 0,
            DurabilityMode::Batched {
                interval_ms,
                batch_size,
            } => {
                pending > 0
                    && (pending >= batch_size
                        || since_sync >= Duration::from_millis(interval_ms))
            }
        }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        Self::buffered_default()
    }
}

impl fmt::Display for DurabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurabilityMode::None => write!(f, "none"),
            DurabilityMode::Strict => write!(f, "strict"),
            DurabilityMode::Batched {
                interval_ms,
                batch_size,
            } => write!(f, "batched({}ms, {} writes)", interval_ms, batch_size),
        }
    }
}

impl FromStr for DurabilityMode {
    type Err = String;

    /// Parse a mode name. `batched` (alias `buffered`) takes default bounds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(DurabilityMode::None),
            "strict" => Ok(DurabilityMode::Strict),
            "batched" | "buffered" => Ok(DurabilityMode::buffered_default()),
            other => Err(format!(
                "unknown durability mode '{}' (expected none, strict or batched)",
                other
            )),
        }
    }
}
