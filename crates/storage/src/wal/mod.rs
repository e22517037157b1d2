//! Write-ahead log: durability policy, the append path and background sync.

pub mod durability;
pub mod flusher;
pub mod writer;

pub use durability::DurabilityMode;
pub use flusher::Flusher;
pub use writer::LogWriter;
