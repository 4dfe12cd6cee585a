//! Twelve-character hash keys.
//!
//! Keys are drawn from a URL-safe base64 alphabet (`A-Z a-z 0-9 - _`). A document
//! key splits into a six-character local hash (path and content) followed by a
//! six-character host hash, so all documents of one host share the key suffix.

use std::fmt;
use std::str::FromStr;

use rwi_common::{Result, error::Error, verify_arg};

pub const KEY_LENGTH: usize = 12;
pub const SEGMENT_LENGTH: usize = 6;

/// Whether `b` belongs to the key alphabet.
#[inline]
pub fn is_key_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Whether every byte of `bytes` belongs to the key alphabet.
pub fn is_key_text(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| is_key_char(b))
}

/// A document key or term hash.
///
/// Ordering is plain byte order. The all-zero key is reserved as a sentinel;
/// zero bytes lie outside the alphabet, so a validated key is never zero.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashKey([u8; KEY_LENGTH]);

pub type DocumentKey = HashKey;
pub type TermHash = HashKey;

impl HashKey {
    pub const ZERO: HashKey = HashKey([0; KEY_LENGTH]);

    /// Validates length and alphabet.
    pub fn from_bytes(bytes: &[u8]) -> Result<HashKey> {
        let raw: [u8; KEY_LENGTH] = bytes.try_into().map_err(|_| {
            Error::invalid_arg(
                "key",
                format!("key requires exactly {KEY_LENGTH} bytes, got {}", bytes.len()),
            )
        })?;
        if !is_key_text(&raw) {
            return Err(Error::invalid_arg("key", "character outside the key alphabet"));
        }
        Ok(HashKey(raw))
    }

    /// Wraps stored key bytes without validating the alphabet.
    pub const fn from_raw(raw: [u8; KEY_LENGTH]) -> HashKey {
        HashKey(raw)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; KEY_LENGTH]
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }

    /// Key text. Bytes that are not valid UTF-8 yield an empty string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("")
    }

    /// First six characters.
    pub fn local_hash(&self) -> &[u8] {
        &self.0[..SEGMENT_LENGTH]
    }

    /// Last six characters.
    pub fn host_hash(&self) -> &[u8] {
        &self.0[SEGMENT_LENGTH..]
    }

    /// Reassembles a key from its two halves.
    pub fn from_parts(local: &[u8], host: &[u8]) -> Result<HashKey> {
        verify_arg!(local, local.len() == SEGMENT_LENGTH, "local hash has {} bytes", local.len());
        verify_arg!(host, host.len() == SEGMENT_LENGTH, "host hash has {} bytes", host.len());
        let mut raw = [0u8; KEY_LENGTH];
        raw[..SEGMENT_LENGTH].copy_from_slice(local);
        raw[SEGMENT_LENGTH..].copy_from_slice(host);
        HashKey::from_bytes(&raw)
    }
}

impl FromStr for HashKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<HashKey> {
        HashKey::from_bytes(s.as_bytes())
    }
}

impl TryFrom<&[u8]> for HashKey {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<HashKey> {
        HashKey::from_bytes(bytes)
    }
}

impl AsRef<[u8]> for HashKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            f.write_str("<zero>")
        } else {
            f.write_str(&String::from_utf8_lossy(&self.0))
        }
    }
}

impl fmt::Debug for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashKey({self})")
    }
}
