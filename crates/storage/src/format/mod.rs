//! On-disk byte formats for the store log.
//!
//! This module centralizes all serialization logic for persistent storage.
//! Keeping serialization separate from operational logic (how the log is
//! written, replayed and compacted) makes format evolution easier to manage.
//!
//! # Module Structure
//!
//! - `log_record`: log file header and record format

pub mod log_record;

pub use log_record::{
    decode_header, encode_header, LogRecord, RecordError, LOG_FORMAT_VERSION, LOG_HEADER_SIZE,
    LOG_MAGIC, MAX_PAYLOAD_LEN, RECORD_FRAME_SIZE,
};
