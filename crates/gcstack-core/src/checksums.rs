//! Content digests recorded on object metadata.
//!
//! The JSON API reports `md5Hash` as the base64 of the raw MD5 digest and
//! `crc32c` as the base64 of the big-endian CRC32C value.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use md5::{Digest, Md5};

/// Base64-encoded MD5 digest of `data`.
///
/// # Examples
///
/// ```
/// use gcstack_core::checksums::compute_md5_base64;
///
/// assert_eq!(compute_md5_base64(b"hello"), "XUFAKrxLKna5cZ2REBfFkg==");
/// ```
#[must_use]
pub fn compute_md5_base64(data: &[u8]) -> String {
    BASE64_STANDARD.encode(Md5::digest(data))
}

/// Base64-encoded big-endian CRC32C of `data`.
///
/// # Examples
///
/// ```
/// use gcstack_core::checksums::compute_crc32c_base64;
///
/// assert_eq!(compute_crc32c_base64(b"hello"), "mnG7TA==");
/// ```
#[must_use]
pub fn compute_crc32c_base64(data: &[u8]) -> String {
    BASE64_STANDARD.encode(crc32c::crc32c(data).to_be_bytes())
}

/// Entity tag derived from the content MD5.
#[must_use]
pub fn compute_etag(md5_base64: &str, metageneration: u64) -> String {
    format!("{md5_base64}/{metageneration}")
}
