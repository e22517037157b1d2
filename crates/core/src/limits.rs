//! Size limits for keys and values.
//!
//! Checked before a write reaches any backend, so an oversized entry never
//! produces a partial on-disk record.

use crate::error::{Error, Result};

/// Maximum key length in bytes (64 KiB).
pub const MAX_KEY_LEN: usize = 64 * 1024;

/// Maximum value length in bytes (16 MiB).
pub const MAX_VALUE_LEN: usize = 16 * 1024 * 1024;

/// Validate a key against [`MAX_KEY_LEN`].
pub fn validate_key(key: &str) -> Result<()> {
    if key.len() > MAX_KEY_LEN {
        return Err(Error::ConstraintViolation(format!(
            "key length {} exceeds limit {}",
            key.len(),
            MAX_KEY_LEN
        )));
    }
    Ok(())
}

/// Validate a key and value against [`MAX_KEY_LEN`] and [`MAX_VALUE_LEN`].
pub fn validate_entry(key: &str, value: &str) -> Result<()> {
    validate_key(key)?;
    if value.len() > MAX_VALUE_LEN {
        return Err(Error::ConstraintViolation(format!(
            "value length {} exceeds limit {}",
            value.len(),
            MAX_VALUE_LEN
        )));
    }
    Ok(())
}
