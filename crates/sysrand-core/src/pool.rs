//! The randomness pool.
//!
//! A fixed-size byte buffer that XOR-accumulates probe contributions at a
//! wrapping write cursor and is periodically diffused by a chained SHA-512
//! mix. Extraction XORs pool contents into the caller's buffer from a
//! separate wrapping read cursor; the two-pass fetch discipline that sits
//! on top lives in [`crate::rng`].
//!
//! The backing storage is pinned to physical memory where the OS permits
//! and scrubbed to zero before release.

use zeroize::Zeroize;

use sysrand_types::{RngError, SHA512_DIGEST_LEN};

use crate::crypto;

/// Default pool capacity in bytes. Must be a positive multiple of the
/// SHA-512 digest length.
pub const POOL_SIZE: usize = 384;

/// A pool mix is forced after this many accumulated bytes.
pub const MIX_INTERVAL: usize = 32;

/// The randomness pool.
pub struct Pool {
    bytes: Vec<u8>,
    write_cursor: usize,
    read_cursor: usize,
    bytes_since_mix: usize,
    locked: bool,
}

impl Pool {
    /// Create a pool of the default size.
    pub fn new() -> Result<Self, RngError> {
        Self::with_size(POOL_SIZE)
    }

    /// Create a pool of `size` bytes.
    ///
    /// `size` must be a positive multiple of the digest length; anything
    /// else is a configuration bug and fails deterministically here.
    pub fn with_size(size: usize) -> Result<Self, RngError> {
        if size == 0 || size % SHA512_DIGEST_LEN != 0 {
            return Err(RngError::InvalidArgument);
        }

        let bytes = vec![0u8; size];
        let locked = lock_memory(&bytes);
        if !locked {
            log::debug!("pool storage could not be pinned; continuing unpinned");
        }

        Ok(Pool {
            bytes,
            write_cursor: 0,
            read_cursor: 0,
            bytes_since_mix: 0,
            locked,
        })
    }

    /// Pool capacity in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// XOR a single byte into the pool at the write cursor.
    ///
    /// Every `MIX_INTERVAL` accumulated bytes the pool is mixed before
    /// further writes.
    pub fn add_byte(&mut self, x: u8) {
        if self.write_cursor == self.bytes.len() {
            self.write_cursor = 0;
        }
        self.bytes[self.write_cursor] ^= x;
        self.write_cursor += 1;
        self.bytes_since_mix += 1;
        if self.bytes_since_mix >= MIX_INTERVAL {
            self.mix();
        }
    }

    /// XOR a buffer into the pool byte by byte.
    pub fn add_bytes(&mut self, src: &[u8]) {
        for &b in src {
            self.add_byte(b);
        }
    }

    /// Add a 16-bit value in little-endian byte order.
    pub fn add_u16(&mut self, x: u16) {
        self.add_bytes(&x.to_le_bytes());
    }

    /// Add a 32-bit value in little-endian byte order.
    pub fn add_u32(&mut self, x: u32) {
        self.add_bytes(&x.to_le_bytes());
    }

    /// Add a 64-bit value in little-endian byte order.
    pub fn add_u64(&mut self, x: u64) {
        self.add_bytes(&x.to_le_bytes());
    }

    /// Mix the pool.
    ///
    /// For each digest-sized block: hash the entire pool and XOR the
    /// digest into that block. Each subsequent hash sees the already
    /// partially updated pool, so every output bit depends on every
    /// input bit.
    pub fn mix(&mut self) {
        let blocks = self.bytes.len() / SHA512_DIGEST_LEN;
        for i in 0..blocks {
            let mut digest = crypto::sha512(&self.bytes);
            let block = &mut self.bytes[i * SHA512_DIGEST_LEN..(i + 1) * SHA512_DIGEST_LEN];
            for (b, d) in block.iter_mut().zip(digest.iter()) {
                *b ^= d;
            }
            digest.zeroize();
        }
        self.bytes_since_mix = 0;
    }

    /// XOR pool contents into `out`, starting at the read cursor and
    /// wrapping. The read cursor persists across calls.
    pub fn extract_xor(&mut self, out: &mut [u8]) {
        for b in out.iter_mut() {
            if self.read_cursor == self.bytes.len() {
                self.read_cursor = 0;
            }
            *b ^= self.bytes[self.read_cursor];
            self.read_cursor += 1;
        }
    }

    /// Invert every bit of the pool.
    pub fn invert(&mut self) {
        for b in self.bytes.iter_mut() {
            *b ^= 0xff;
        }
    }

    /// Zero the pool contents and reset the cursors.
    pub fn scrub(&mut self) {
        self.bytes.zeroize();
        self.write_cursor = 0;
        self.read_cursor = 0;
        self.bytes_since_mix = 0;
    }

    #[cfg(test)]
    pub(crate) fn contents(&self) -> &[u8] {
        &self.bytes
    }

    #[cfg(test)]
    pub(crate) fn bytes_since_mix(&self) -> usize {
        self.bytes_since_mix
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.scrub();
        if self.locked {
            unlock_memory(&self.bytes);
        }
    }
}

#[cfg(unix)]
fn lock_memory(buf: &[u8]) -> bool {
    // mlock wants the region to stay resident; failure (e.g. RLIMIT_MEMLOCK)
    // is tolerated.
    unsafe { libc::mlock(buf.as_ptr().cast(), buf.len()) == 0 }
}

#[cfg(not(unix))]
fn lock_memory(_buf: &[u8]) -> bool {
    false
}

#[cfg(unix)]
fn unlock_memory(buf: &[u8]) {
    unsafe {
        libc::munlock(buf.as_ptr().cast(), buf.len());
    }
}

#[cfg(not(unix))]
fn unlock_memory(_buf: &[u8]) {}
