//! HMAC-SHA256 implementation (RFC 2104).
//!
//! Each padded key block is compressed once from the IV, and the message is
//! then fed through [`sha256::compress_from`] with a 64-byte offset. The
//! intermediate state is never serialized between the two passes except to
//! produce the inner digest.

#![forbid(unsafe_code)]

use crate::sha256::{self, State, BLOCK_SIZE, DIGEST_LEN};
use shamac_core::{Digest, Error, Result};

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// Derive the 64-byte key block: keys longer than a block are hashed first,
/// then zero-padded.
fn key_block(key: &[u8]) -> [u8; BLOCK_SIZE] {
    let mut block = [0u8; BLOCK_SIZE];
    if key.len() > BLOCK_SIZE {
        block[..DIGEST_LEN].copy_from_slice(&sha256::digest(key));
    } else {
        block[..key.len()].copy_from_slice(key);
    }
    block
}

/// State after compressing `key_block ^ pad` from the IV.
fn padded_key_state(key_block: &[u8; BLOCK_SIZE], pad: u8) -> State {
    let mut padded = [0u8; BLOCK_SIZE];
    for (p, k) in padded.iter_mut().zip(key_block) {
        *p = k ^ pad;
    }

    let mut schedule = [0u32; 64];
    sha256::load_block(&mut schedule, &padded);

    let mut state = sha256::IV;
    sha256::compress(&mut schedule, &mut state);
    state
}

/// Compute HMAC-SHA256.
///
/// HMAC(K, m) = H((K' XOR opad) || H((K' XOR ipad) || m))
/// where K' is the key padded/hashed to block size.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; DIGEST_LEN] {
    let key_block = key_block(key);

    // Inner hash: H(i_key_pad || data)
    let mut inner = padded_key_state(&key_block, IPAD);
    sha256::compress_from(&mut inner, BLOCK_SIZE as u64, data);
    let inner_hash = sha256::state_to_bytes(&inner);

    // Outer hash: H(o_key_pad || inner_hash)
    let mut outer = padded_key_state(&key_block, OPAD);
    sha256::compress_from(&mut outer, BLOCK_SIZE as u64, &inner_hash);
    sha256::state_to_bytes(&outer)
}

/// Write the HMAC-SHA256 of `data` under `key` into `out`.
///
/// Writes `min(out.len(), 32)` bytes; bytes past the first 32 are left untouched.
pub fn sha256_hmac(key: &[u8], data: &[u8], out: &mut [u8]) {
    let mac = hmac_sha256(key, data);
    let n = out.len().min(DIGEST_LEN);
    out[..n].copy_from_slice(&mac[..n]);
}

/// Check a (possibly truncated) tag against the HMAC of `data` under `key`.
///
/// The comparison is constant-time in the tag contents.
pub fn verify(key: &[u8], data: &[u8], tag: &[u8]) -> Result<()> {
    if tag.is_empty() || tag.len() > DIGEST_LEN {
        return Err(Error::InvalidTagLength { got: tag.len() });
    }

    let expected = Digest::from_bytes(hmac_sha256(key, data));
    if expected.ct_eq_prefix(tag) {
        Ok(())
    } else {
        Err(Error::TagMismatch)
    }
}
