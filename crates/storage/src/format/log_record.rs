//! Log file header and record format.
//!
//! # File Layout
//!
//! ```text
//! +------------------+
//! | Magic (4)        |  "RKVL"
//! | Version (2)      |  LOG_FORMAT_VERSION
//! | Reserved (2)     |  zero
//! +------------------+
//! | Record 0         |
//! | Record 1         |
//! | ...              |
//! +------------------+
//! ```
//!
//! # Record Layout
//!
//! ```text
//! +------------------+
//! | Length (4)       |  payload length
//! | Length CRC (4)   |  checksum of the length field
//! | CRC32 (4)        |  checksum of payload
//! | Kind (1)         |  1 = set, 2 = remove
//! | Key len (4)      |
//! | Key (variable)   |
//! | Value len (4)    |  set only
//! | Value (variable) |  set only
//! +------------------+
//! ```
//!
//! All integers are little-endian.
//!
//! The length has its own checksum so a damaged length is reported as
//! corruption rather than read as a record running past the end of the file.

use byteorder::{ByteOrder, LittleEndian};
use rollout_kv_core::{MAX_KEY_LEN, MAX_VALUE_LEN};
use thiserror::Error;

/// Magic bytes at the start of every log file.
pub const LOG_MAGIC: [u8; 4] = *b"RKVL";

/// Current log format version.
pub const LOG_FORMAT_VERSION: u16 = 1;

/// Size of the file header in bytes.
pub const LOG_HEADER_SIZE: usize = 8;

/// Size of the per-record frame (length + length CRC + payload CRC) in bytes.
pub const RECORD_FRAME_SIZE: usize = 12;

/// Largest payload a valid record can carry.
pub const MAX_PAYLOAD_LEN: usize = 1 + 4 + MAX_KEY_LEN + 4 + MAX_VALUE_LEN;

const KIND_SET: u8 = 1;
const KIND_REMOVE: u8 = 2;

/// Errors from decoding the header or a record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// Buffer ends before the record does (torn write)
    #[error("incomplete record: need {needed} bytes, have {have}")]
    Incomplete {
        /// Bytes required to finish the record
        needed: usize,
        /// Bytes available
        have: usize,
    },

    /// Payload checksum does not match
    #[error("checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Stored checksum
        expected: u32,
        /// Computed checksum
        computed: u32,
        /// Total record size (frame + payload), for skipping past it
        record_len: usize,
    },

    /// Length field does not match its checksum; the frame cannot be trusted
    #[error("corrupt record frame: length checksum mismatch")]
    CorruptFrame,

    /// Length field larger than any valid record; the frame cannot be trusted
    #[error("record length {0} exceeds maximum")]
    OversizedLength(usize),

    /// Checksum valid but payload is not a well-formed record
    #[error("malformed record: {reason}")]
    Malformed {
        /// What was wrong
        reason: String,
        /// Total record size (frame + payload), for skipping past it
        record_len: usize,
    },

    /// File header is invalid
    #[error("invalid log header: {0}")]
    InvalidHeader(String),
}

impl RecordError {
    /// Size of the offending record when its frame is intact, so replay can
    /// step over it.
    pub fn record_len(&self) -> Option<usize> {
        match self {
            RecordError::ChecksumMismatch { record_len, .. }
            | RecordError::Malformed { record_len, .. } => Some(*record_len),
            _ => None,
        }
    }
}

/// Encode the file header.
pub fn encode_header() -> [u8; LOG_HEADER_SIZE] {
    let mut buf = [0u8; LOG_HEADER_SIZE];
    buf[0..4].copy_from_slice(&LOG_MAGIC);
    LittleEndian::write_u16(&mut buf[4..6], LOG_FORMAT_VERSION);
    buf
}

/// Validate a file header.
pub fn decode_header(buf: &[u8]) -> Result<(), RecordError> {
    if buf.len() < LOG_HEADER_SIZE {
        return Err(RecordError::Incomplete {
            needed: LOG_HEADER_SIZE,
            have: buf.len(),
        });
    }
    if buf[0..4] != LOG_MAGIC {
        return Err(RecordError::InvalidHeader(format!(
            "bad magic {:?}",
            &buf[0..4]
        )));
    }
    let version = LittleEndian::read_u16(&buf[4..6]);
    if version != LOG_FORMAT_VERSION {
        return Err(RecordError::InvalidHeader(format!(
            "unsupported format version {} (expected {})",
            version, LOG_FORMAT_VERSION
        )));
    }
    Ok(())
}

/// A single mutation in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    /// Key set to value
    Set {
        /// Key written
        key: String,
        /// Value written
        value: String,
    },
    /// Key removed
    Remove {
        /// Key removed
        key: String,
    },
}

impl LogRecord {
    /// Key this record touches.
    pub fn key(&self) -> &str {
        match self {
            LogRecord::Set { key, .. } | LogRecord::Remove { key } => key,
        }
    }

    fn payload_len(&self) -> usize {
        match self {
            LogRecord::Set { key, value } => 1 + 4 + key.len() + 4 + value.len(),
            LogRecord::Remove { key } => 1 + 4 + key.len(),
        }
    }

    /// Total encoded size including the frame.
    pub fn encoded_len(&self) -> usize {
        RECORD_FRAME_SIZE + self.payload_len()
    }

    /// Encoded size of a set record, without building one.
    pub fn set_len(key: &str, value: &str) -> usize {
        RECORD_FRAME_SIZE + 1 + 4 + key.len() + 4 + value.len()
    }

    /// Encode into a framed byte buffer.
    pub fn encode(&self) -> Vec<u8> {
        let payload_len = self.payload_len();
        let mut buf = vec![0u8; RECORD_FRAME_SIZE + payload_len];

        let payload = &mut buf[RECORD_FRAME_SIZE..];
        let mut pos = 0;
        match self {
            LogRecord::Set { key, value } => {
                payload[pos] = KIND_SET;
                pos += 1;
                pos = put_bytes(payload, pos, key.as_bytes());
                put_bytes(payload, pos, value.as_bytes());
            }
            LogRecord::Remove { key } => {
                payload[pos] = KIND_REMOVE;
                pos += 1;
                put_bytes(payload, pos, key.as_bytes());
            }
        }

        let crc = crc32fast::hash(&buf[RECORD_FRAME_SIZE..]);
        LittleEndian::write_u32(&mut buf[0..4], payload_len as u32);
        let len_crc = crc32fast::hash(&buf[0..4]);
        LittleEndian::write_u32(&mut buf[4..8], len_crc);
        LittleEndian::write_u32(&mut buf[8..12], crc);
        buf
    }

    /// Decode one record from the start of `buf`.
    ///
    /// Returns the record and the number of bytes consumed. `Incomplete` is
    /// only returned once the frame has verified, so it always means the
    /// record runs past the end of `buf`.
    pub fn decode(buf: &[u8]) -> Result<(LogRecord, usize), RecordError> {
        if buf.len() < RECORD_FRAME_SIZE {
            return Err(RecordError::Incomplete {
                needed: RECORD_FRAME_SIZE,
                have: buf.len(),
            });
        }

        if crc32fast::hash(&buf[0..4]) != LittleEndian::read_u32(&buf[4..8]) {
            return Err(RecordError::CorruptFrame);
        }
        let payload_len = LittleEndian::read_u32(&buf[0..4]) as usize;
        let expected = LittleEndian::read_u32(&buf[8..12]);
        if payload_len > MAX_PAYLOAD_LEN {
            return Err(RecordError::OversizedLength(payload_len));
        }

        let record_len = RECORD_FRAME_SIZE + payload_len;
        if buf.len() < record_len {
            return Err(RecordError::Incomplete {
                needed: record_len,
                have: buf.len(),
            });
        }

        let payload = &buf[RECORD_FRAME_SIZE..record_len];
        let computed = crc32fast::hash(payload);
        if computed != expected {
            return Err(RecordError::ChecksumMismatch {
                expected,
                computed,
                record_len,
            });
        }

        let malformed = |reason: &str| RecordError::Malformed {
            reason: reason.to_string(),
            record_len,
        };

        if payload.is_empty() {
            return Err(malformed("empty payload"));
        }
        let kind = payload[0];
        let (key, pos) = take_string(payload, 1).ok_or_else(|| malformed("bad key"))?;

        let record = match kind {
            KIND_SET => {
                let (value, pos) =
                    take_string(payload, pos).ok_or_else(|| malformed("bad value"))?;
                if pos != payload.len() {
                    return Err(malformed("trailing bytes"));
                }
                LogRecord::Set { key, value }
            }
            KIND_REMOVE => {
                if pos != payload.len() {
                    return Err(malformed("trailing bytes"));
                }
                LogRecord::Remove { key }
            }
            other => return Err(malformed(&format!("unknown kind {}", other))),
        };

        Ok((record, record_len))
    }
}

fn put_bytes(buf: &mut [u8], pos: usize, bytes: &[u8]) -> usize {
    LittleEndian::write_u32(&mut buf[pos..pos + 4], bytes.len() as u32);
    let start = pos + 4;
    buf[start..start + bytes.len()].copy_from_slice(bytes);
    start + bytes.len()
}

fn take_string(buf: &[u8], pos: usize) -> Option<(String, usize)> {
    let len_end = pos.checked_add(4)?;
    let len = LittleEndian::read_u32(buf.get(pos..len_end)?) as usize;
    let end = len_end.checked_add(len)?;
    let bytes = buf.get(len_end..end)?;
    let s = String::from_utf8(bytes.to_vec()).ok()?;
    Some((s, end))
}
