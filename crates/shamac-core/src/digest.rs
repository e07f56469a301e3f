//! 32-byte SHA-256 output value.

use std::fmt;

use crate::{Error, Result};

/// SHA-256 output length in bytes.
pub const DIGEST_LEN: usize = 32;

/// A full SHA-256 or HMAC-SHA256 output.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Decode an expected digest or tag given as hex (either case).
    ///
    /// Accepts a truncated value: 1 to 32 bytes.
    pub fn decode_prefix(s: &str) -> Result<Vec<u8>> {
        let bytes = hex::decode(s.trim()).map_err(|e| Error::InvalidHex(e.to_string()))?;
        if bytes.is_empty() || bytes.len() > DIGEST_LEN {
            return Err(Error::InvalidTagLength { got: bytes.len() });
        }
        Ok(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First `min(len, 32)` bytes.
    pub fn prefix(&self, len: usize) -> &[u8] {
        &self.0[..len.min(DIGEST_LEN)]
    }

    /// Constant-time comparison of `tag` against the leading bytes of this digest.
    ///
    /// Runs in time dependent only on `tag.len()`. An empty tag or one longer
    /// than 32 bytes never matches.
    pub fn ct_eq_prefix(&self, tag: &[u8]) -> bool {
        if tag.is_empty() || tag.len() > DIGEST_LEN {
            return false;
        }
        let diff = self
            .0
            .iter()
            .zip(tag)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        diff == 0
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}
