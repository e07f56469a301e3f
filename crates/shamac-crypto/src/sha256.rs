//! SHA-256 implementation (FIPS 180-4).
//!
//! The engine is exposed in three layers: [`compress`] runs the round
//! function over one prepared message schedule, [`compress_from`] pads and
//! feeds arbitrary input starting from any state, and [`digest`] /
//! [`sha256`] wrap the two with the standard IV.
//!
//! State words stay in native order throughout; conversion to big-endian
//! bytes happens once, in [`state_to_bytes`].

#![forbid(unsafe_code)]

pub use shamac_core::DIGEST_LEN;

/// Block size in bytes.
pub const BLOCK_SIZE: usize = 64;

/// Running hash value, words A..H.
pub type State = [u32; 8];

/// Initial hash values (first 32 bits of fractional parts of square roots of first 8 primes).
pub const IV: State = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a,
    0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

/// Round constants (first 32 bits of fractional parts of cube roots of first 64 primes).
const K: [u32; 64] = [
    0x428a2f98, 0x71374491, 0xb5c0fbcf, 0xe9b5dba5,
    0x3956c25b, 0x59f111f1, 0x923f82a4, 0xab1c5ed5,
    0xd807aa98, 0x12835b01, 0x243185be, 0x550c7dc3,
    0x72be5d74, 0x80deb1fe, 0x9bdc06a7, 0xc19bf174,
    0xe49b69c1, 0xefbe4786, 0x0fc19dc6, 0x240ca1cc,
    0x2de92c6f, 0x4a7484aa, 0x5cb0a9dc, 0x76f988da,
    0x983e5152, 0xa831c66d, 0xb00327c8, 0xbf597fc7,
    0xc6e00bf3, 0xd5a79147, 0x06ca6351, 0x14292967,
    0x27b70a85, 0x2e1b2138, 0x4d2c6dfc, 0x53380d13,
    0x650a7354, 0x766a0abb, 0x81c2c92e, 0x92722c85,
    0xa2bfe8a1, 0xa81a664b, 0xc24b8b70, 0xc76c51a3,
    0xd192e819, 0xd6990624, 0xf40e3585, 0x106aa070,
    0x19a4c116, 0x1e376c08, 0x2748774c, 0x34b0bcb5,
    0x391c0cb3, 0x4ed8aa4a, 0x5b9cca4f, 0x682e6ff3,
    0x748f82ee, 0x78a5636f, 0x84c87814, 0x8cc70208,
    0x90befffa, 0xa4506ceb, 0xbef9a3f7, 0xc67178f2,
];

/// Padding terminator: a single '1' bit followed by zeros.
const TERMINATOR: u8 = 0x80;

/// Bytes reserved at the end of the final block for the bit length.
const LENGTH_LEN: usize = 8;

#[inline(always)]
fn ch(x: u32, y: u32, z: u32) -> u32 {
    (x & y) ^ (!x & z)
}

#[inline(always)]
fn maj(x: u32, y: u32, z: u32) -> u32 {
    (x & y) ^ (x & z) ^ (y & z)
}

#[inline(always)]
fn big_sigma0(x: u32) -> u32 {
    x.rotate_right(2) ^ x.rotate_right(13) ^ x.rotate_right(22)
}

#[inline(always)]
fn big_sigma1(x: u32) -> u32 {
    x.rotate_right(6) ^ x.rotate_right(11) ^ x.rotate_right(25)
}

#[inline(always)]
fn small_sigma0(x: u32) -> u32 {
    x.rotate_right(7) ^ x.rotate_right(18) ^ (x >> 3)
}

#[inline(always)]
fn small_sigma1(x: u32) -> u32 {
    x.rotate_right(17) ^ x.rotate_right(19) ^ (x >> 10)
}

/// Number of 64-byte blocks produced by padding `len` bytes of input.
///
/// Always at least 1; the `+ 9` covers the terminator byte and the 8-byte
/// length trailer.
pub const fn block_count(len: usize) -> usize {
    (len + 1 + LENGTH_LEN).div_ceil(BLOCK_SIZE)
}

/// Load a 64-byte block into schedule words 0..16 as big-endian words.
pub fn load_block(schedule: &mut [u32; 64], block: &[u8; BLOCK_SIZE]) {
    for (word, chunk) in schedule.iter_mut().zip(block.chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
}

/// Run the compression function over one block.
///
/// `schedule[0..16]` must already hold the block words (see [`load_block`]).
/// Words 16..64 are overwritten by the schedule expansion, and the round
/// output is added into `state`.
pub fn compress(schedule: &mut [u32; 64], state: &mut State) {
    // Extend to 64 words
    for t in 16..64 {
        schedule[t] = schedule[t - 16]
            .wrapping_add(schedule[t - 7])
            .wrapping_add(small_sigma0(schedule[t - 15]))
            .wrapping_add(small_sigma1(schedule[t - 2]));
    }

    let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = *state;

    for t in 0..64 {
        let t1 = h
            .wrapping_add(big_sigma1(e))
            .wrapping_add(ch(e, f, g))
            .wrapping_add(K[t])
            .wrapping_add(schedule[t]);
        let t2 = big_sigma0(a).wrapping_add(maj(a, b, c));

        h = g;
        g = f;
        f = e;
        e = d.wrapping_add(t1);
        d = c;
        c = b;
        b = a;
        a = t1.wrapping_add(t2);
    }

    for (s, v) in state.iter_mut().zip([a, b, c, d, e, f, g, h]) {
        *s = s.wrapping_add(v);
    }
}

/// Pad `data` and compress it into `state`.
///
/// `already_processed` is the number of message bytes already folded into
/// `state` (always a multiple of the block size). It only contributes to the
/// length trailer, which encodes `(data.len() + already_processed) * 8` bits
/// modulo 2^64.
pub fn compress_from(state: &mut State, already_processed: u64, data: &[u8]) {
    let len = data.len();
    let bit_len = (len as u64).wrapping_add(already_processed).wrapping_mul(8);
    let blocks = block_count(len);

    let mut schedule = [0u32; 64];
    let mut block = [0u8; BLOCK_SIZE];
    let mut consumed = 0usize;
    let mut terminated = false;

    for i in 0..blocks {
        let amt = (len - consumed).min(BLOCK_SIZE);
        block[..amt].copy_from_slice(&data[consumed..consumed + amt]);
        block[amt..].fill(0);
        consumed += amt;

        // A data block that ends exactly on the boundary pushes the
        // terminator into the following block.
        if !terminated && consumed == len && amt < BLOCK_SIZE {
            block[amt] = TERMINATOR;
            terminated = true;
        }

        if i == blocks - 1 {
            block[BLOCK_SIZE - LENGTH_LEN..].copy_from_slice(&bit_len.to_be_bytes());
        }

        load_block(&mut schedule, &block);
        compress(&mut schedule, state);
    }
}

/// Serialize a state as 32 big-endian bytes.
pub fn state_to_bytes(state: &State) -> [u8; DIGEST_LEN] {
    let mut out = [0u8; DIGEST_LEN];
    for (chunk, word) in out.chunks_exact_mut(4).zip(state) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    out
}

/// Compute SHA-256 digest of input data.
pub fn digest(data: &[u8]) -> [u8; DIGEST_LEN] {
    let mut state = IV;
    compress_from(&mut state, 0, data);
    state_to_bytes(&state)
}

/// Write the digest of `data` into `out`.
///
/// Writes `min(out.len(), 32)` bytes. A shorter `out` receives a truncated
/// digest; bytes past the first 32 are left untouched.
pub fn sha256(data: &[u8], out: &mut [u8]) {
    let full = digest(data);
    let n = out.len().min(DIGEST_LEN);
    out[..n].copy_from_slice(&full[..n]);
}
