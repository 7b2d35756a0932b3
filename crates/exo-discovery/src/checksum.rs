//! SHA-256 digests for plugin integrity verification.
//!
//! Manifests store digests as lowercase hex, the format written by the
//! `sha256sum` tool.

use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;

/// Length of a SHA-256 digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Compares two byte strings in constant time.
///
/// All bytes of the longer input are visited regardless of where the first
/// difference is, so timing does not reveal a matching prefix.
///
/// # Examples
///
/// ```
/// use exo_discovery::checksum::constant_time_eq;
///
/// assert!(constant_time_eq(b"abc123", b"abc123"));
/// assert!(!constant_time_eq(b"abc123", b"abc124"));
/// assert!(!constant_time_eq(b"abc", b"abcdef"));
/// ```
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let len_match = a.len() == b.len();
    let max_len = a.len().max(b.len());

    let mut diff = 0_u8;
    for i in 0..max_len {
        let byte_a = a.get(i).copied().unwrap_or(0);
        let byte_b = b.get(i).copied().unwrap_or(0);
        diff |= byte_a ^ byte_b;
    }

    len_match && diff == 0
}

/// Hex-encoded SHA-256 digest of `data`.
///
/// # Examples
///
/// ```
/// use exo_discovery::checksum::sha256_hex;
///
/// assert_eq!(
///     sha256_hex(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Streams a file through SHA-256.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be opened or read.
pub fn digest_file(path: &Path) -> io::Result<[u8; DIGEST_LEN]> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().into())
}

/// Decodes a hex digest as found in a manifest.
///
/// Returns `None` unless `encoded` is exactly 64 hex digits (either case).
///
/// # Examples
///
/// ```
/// use exo_discovery::checksum::decode_digest;
///
/// assert!(decode_digest(&"AB".repeat(32)).is_some());
/// assert!(decode_digest("abcdef").is_none());
/// assert!(decode_digest(&"xy".repeat(32)).is_none());
/// ```
#[must_use]
pub fn decode_digest(encoded: &str) -> Option<[u8; DIGEST_LEN]> {
    let mut digest = [0_u8; DIGEST_LEN];
    hex::decode_to_slice(encoded, &mut digest).ok()?;
    Some(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_constant_time_eq_identical() {
        assert!(constant_time_eq(b"", b""));
        assert!(constant_time_eq(b"test", b"test"));
    }

    #[test]
    fn test_constant_time_eq_differs_at_edges() {
        assert!(!constant_time_eq(b"a00000", b"b00000"));
        assert!(!constant_time_eq(b"00000a", b"00000b"));
    }

    #[test]
    fn test_constant_time_eq_length_mismatch() {
        assert!(!constant_time_eq(b"", b"a"));
        assert!(!constant_time_eq(b"abc\0", b"abc"));
    }

    #[test]
    fn test_digest_file_matches_in_memory_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugin");
        fs::write(&path, b"#!/bin/sh\necho hi\n").unwrap();

        let digest = digest_file(&path).unwrap();
        assert_eq!(hex::encode(digest), sha256_hex(b"#!/bin/sh\necho hi\n"));
    }

    #[test]
    fn test_digest_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(digest_file(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_decode_digest_round_trip() {
        let encoded = sha256_hex(b"payload");
        let decoded = decode_digest(&encoded).unwrap();
        assert_eq!(hex::encode(decoded), encoded);
    }
}
