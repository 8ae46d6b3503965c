//! Digests and hash prefixes
//!
//! Every permutation is hashed with SHA-256. The full 32-byte digest is the
//! identity used for reconciliation; the first 4 bytes form the prefix that
//! goes on the wire.
//!
//! # Encoding
//!
//! Base64 (standard alphabet, padded) is only the transport representation.
//! Keys and comparisons always use the raw bytes, so `"AAAA"` and an unpadded
//! or re-padded variant of the same bytes can never split into two entries.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest as _, Sha256};

/// Length of a full digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Length of a lookup prefix in bytes.
pub const PREFIX_LEN: usize = 4;

/// Error type for base64 hash decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashDecodeError {
    #[error("invalid base64: {0}")]
    InvalidBase64(String),
    #[error("expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

// =============================================================================
// Digest
// =============================================================================

/// Full SHA-256 digest of a permutation string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Hash a permutation string (UTF-8 bytes).
    #[inline]
    pub fn of(text: &str) -> Self {
        let mut bytes = [0u8; DIGEST_LEN];
        bytes.copy_from_slice(&Sha256::digest(text.as_bytes()));
        Self(bytes)
    }

    /// Leading 4 bytes.
    #[inline]
    pub fn prefix(&self) -> Prefix {
        Prefix([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }
}

impl TryFrom<&[u8]> for Digest {
    type Error = HashDecodeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; DIGEST_LEN] = bytes.try_into().map_err(|_| HashDecodeError::WrongLength {
            expected: DIGEST_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(array))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_base64())
    }
}

// =============================================================================
// Prefix
// =============================================================================

/// Truncated hash sent in lookup requests.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Prefix([u8; PREFIX_LEN]);

impl Prefix {
    /// Take the leading 4 bytes of an arbitrary hash.
    /// Returns `None` when fewer than 4 bytes are available.
    pub fn from_leading(bytes: &[u8]) -> Option<Self> {
        let head: [u8; PREFIX_LEN] = bytes.get(..PREFIX_LEN)?.try_into().ok()?;
        Some(Self(head))
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; PREFIX_LEN] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }
}

impl fmt::Debug for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Prefix({})", self.to_base64())
    }
}

/// Decode standard base64.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, HashDecodeError> {
    BASE64
        .decode(encoded.trim())
        .map_err(|e| HashDecodeError::InvalidBase64(e.to_string()))
}

/// Encode bytes as standard base64.
pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_known_values() {
        let digest = Digest::of("google.com/a/b.html");
        assert_eq!(digest.to_base64(), "0h4FTPSJM1Damm/PCrfZXtRDoZC4ARG4gUjf1U8Soz0=");
        assert_eq!(digest.prefix().to_base64(), "0h4FTA==");
        assert_eq!(digest.prefix().as_bytes(), &[0xd2, 0x1e, 0x05, 0x4c]);
    }

    #[test]
    fn test_digest_consistent() {
        assert_eq!(Digest::of("google.com/"), Digest::of("google.com/"));
        assert_ne!(Digest::of("google.com/"), Digest::of("google.com/a/"));
    }

    #[test]
    fn test_digest_from_decoded_bytes() {
        let digest = Digest::of("google.com/");
        let bytes = decode_base64(&digest.to_base64()).unwrap();
        assert_eq!(Digest::try_from(bytes.as_slice()), Ok(digest));
    }

    #[test]
    fn test_digest_rejects_wrong_length() {
        let bytes = decode_base64("0h4FTA==").unwrap();
        assert_eq!(
            Digest::try_from(bytes.as_slice()),
            Err(HashDecodeError::WrongLength { expected: 32, actual: 4 })
        );
        assert!(matches!(
            decode_base64("not base64!"),
            Err(HashDecodeError::InvalidBase64(_))
        ));
    }

    #[test]
    fn test_prefix_from_leading() {
        let prefix = Prefix::from_leading(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(prefix.as_bytes(), &[1, 2, 3, 4]);
        assert_eq!(Prefix::from_leading(&[1, 2, 3]), None);
    }
}
