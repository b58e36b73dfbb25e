//! Blake3 checksums for plugin manifests.
//!
//! Checksums are written as `"blake3:<hex>"` so that manifests stay
//! readable and the algorithm can be told apart from future ones.

use crate::error::{PluginError, PluginResult};

const PREFIX: &str = "blake3:";

/// Compares two checksum strings without short-circuiting on the first
/// differing byte.
///
/// # Examples
///
/// ```
/// use blob_plugin::checksum::constant_time_compare;
///
/// assert!(constant_time_compare("blake3:ab", "blake3:ab"));
/// assert!(!constant_time_compare("blake3:ab", "blake3:ac"));
/// assert!(!constant_time_compare("blake3:ab", "blake3:abc"));
/// ```
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let len = a.len().max(b.len());
    let diff = (0..len).fold(0u8, |acc, i| {
        acc | (a.get(i).copied().unwrap_or(0) ^ b.get(i).copied().unwrap_or(0))
    });
    a.len() == b.len() && diff == 0
}

/// Computes the checksum of `data`.
///
/// # Examples
///
/// ```
/// use blob_plugin::checksum::calculate_checksum;
///
/// let checksum = calculate_checksum(b"plugin bytes");
/// assert!(checksum.starts_with("blake3:"));
/// assert_eq!(checksum.len(), 71);
/// ```
#[must_use]
pub fn calculate_checksum(data: &[u8]) -> String {
    format!("{PREFIX}{}", blake3::hash(data).to_hex())
}

/// Checks `data` against the checksum recorded for the element at `path`.
///
/// # Errors
///
/// Returns [`PluginError::ChecksumMismatch`] if the checksums differ.
pub fn verify_checksum(data: &[u8], expected: &str, path: &str) -> PluginResult<()> {
    let actual = calculate_checksum(data);
    if constant_time_compare(&actual, expected) {
        return Ok(());
    }
    Err(PluginError::ChecksumMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        actual,
    })
}

/// Returns `true` if `checksum` is `blake3:` followed by 64 lowercase hex
/// digits.
#[must_use]
pub fn is_valid_checksum_format(checksum: &str) -> bool {
    checksum.strip_prefix(PREFIX).is_some_and(|hex| {
        hex.len() == 64 && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    })
}
