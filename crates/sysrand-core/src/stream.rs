//! Lightweight Trivium keystream generator.
//!
//! Bit-exact eSTREAM Trivium: a 288-bit state split across three shift
//! registers (93 + 84 + 111 bits), one keystream bit per rotation. The
//! generator runs with a constant 80-bit key and an 80-bit IV drawn from
//! the entropy pool, and reseeds itself with a fresh IV after every
//! 2^20 output bytes. Trivium itself guarantees 2^64 keystream bits, so
//! the reseed period is a wide safety margin, not a cipher limit.

use zeroize::Zeroize;

use sysrand_types::RngError;

use crate::rng;

/// Key length in bytes.
pub const KEY_LEN: usize = 10;
/// IV length in bytes.
pub const IV_LEN: usize = 10;
/// Output bytes between reseeds.
pub const RESEED_PERIOD: u64 = 1 << 20;

/// The constant key: chosen once, statistically independent of anything
/// the pool produces.
const STREAM_KEY: [u8; KEY_LEN] = [
    0xfc, 0xd0, 0xdf, 0x7d, 0x9d, 0xe4, 0x80, 0xac, 0xf8, 0xa2,
];

const MASK_A: u128 = (1 << 93) - 1;
const MASK_B: u128 = (1 << 84) - 1;
const MASK_C: u128 = (1 << 111) - 1;

/// Bit `n` (1-indexed) of a sub-register.
#[inline(always)]
fn bit(x: u128, n: u32) -> u128 {
    (x >> (n - 1)) & 1
}

/// Pool-reseeded Trivium keystream generator.
pub struct StreamGen {
    // s1..s93, s94..s177, s178..s288; bit 0 of each word is the
    // lowest-numbered state bit of its register.
    a: u128,
    b: u128,
    c: u128,
    bytes_since_reseed: u64,
    seed_source: Box<dyn FnMut(&mut [u8]) -> Result<(), RngError> + Send>,
}

impl StreamGen {
    /// Create a generator whose IVs come from the running entropy pool.
    pub fn from_pool() -> Result<Self, RngError> {
        Self::with_seed_source(Box::new(|buf| rng::fetch_bytes(buf, true)))
    }

    /// Create a generator with a caller-supplied IV source.
    pub fn with_seed_source(
        seed_source: Box<dyn FnMut(&mut [u8]) -> Result<(), RngError> + Send>,
    ) -> Result<Self, RngError> {
        let mut gen = StreamGen {
            a: 0,
            b: 0,
            c: 0,
            bytes_since_reseed: 0,
            seed_source,
        };
        gen.reseed()?;
        Ok(gen)
    }

    /// Fetch a fresh IV and rebuild the register.
    fn reseed(&mut self) -> Result<(), RngError> {
        let mut iv = [0u8; IV_LEN];
        (self.seed_source)(&mut iv)?;
        self.init(&STREAM_KEY, &iv);
        iv.zeroize();
        self.bytes_since_reseed = 0;
        Ok(())
    }

    /// Load key and IV (MSB of byte 0 is state bit 1 of its register),
    /// set s286..s288, and clock through the 4 * 288 warm-up rotations
    /// with output discarded.
    fn init(&mut self, key: &[u8; KEY_LEN], iv: &[u8; IV_LEN]) {
        self.a = 0;
        self.b = 0;
        self.c = 0;
        for i in 0..80 {
            let key_bit = ((key[i / 8] >> (7 - (i % 8))) & 1) as u128;
            self.a |= key_bit << i;
            let iv_bit = ((iv[i / 8] >> (7 - (i % 8))) & 1) as u128;
            self.b |= iv_bit << i;
        }
        self.c |= 0b111 << 108;

        for _ in 0..4 * 288 {
            self.rotate();
        }
    }

    /// One rotation; returns the keystream bit.
    ///
    /// z = (s66^s93) ^ (s162^s177) ^ (s243^s288); the feedback into each
    /// register is the neighbour's linear pair plus a quadratic tap pair
    /// (s91·s92, s175·s176, s286·s287) and a cross tap (s171, s264, s69).
    #[inline]
    fn rotate(&mut self) -> u8 {
        let t1 = bit(self.a, 66) ^ bit(self.a, 93);
        let t2 = bit(self.b, 69) ^ bit(self.b, 84);
        let t3 = bit(self.c, 66) ^ bit(self.c, 111);
        let z = (t1 ^ t2 ^ t3) as u8;

        let into_b = t1 ^ (bit(self.a, 91) & bit(self.a, 92)) ^ bit(self.b, 78);
        let into_c = t2 ^ (bit(self.b, 82) & bit(self.b, 83)) ^ bit(self.c, 87);
        let into_a = t3 ^ (bit(self.c, 109) & bit(self.c, 110)) ^ bit(self.a, 69);

        self.a = ((self.a << 1) | into_a) & MASK_A;
        self.b = ((self.b << 1) | into_b) & MASK_B;
        self.c = ((self.c << 1) | into_c) & MASK_C;

        z
    }

    /// Fill `buf` with keystream bytes (MSB-first within each byte),
    /// reseeding whenever the output budget is exhausted.
    pub fn fill_bytes(&mut self, buf: &mut [u8]) -> Result<(), RngError> {
        for byte in buf.iter_mut() {
            if self.bytes_since_reseed >= RESEED_PERIOD {
                self.reseed()?;
            }
            let mut acc = 0u8;
            for _ in 0..8 {
                acc = (acc << 1) | self.rotate();
            }
            *byte = acc;
            self.bytes_since_reseed += 1;
        }
        Ok(())
    }

    /// Next 8 keystream bits.
    pub fn next_u8(&mut self) -> Result<u8, RngError> {
        let mut buf = [0u8; 1];
        self.fill_bytes(&mut buf)?;
        Ok(buf[0])
    }

    /// Next 16 keystream bits.
    pub fn next_u16(&mut self) -> Result<u16, RngError> {
        let mut buf = [0u8; 2];
        self.fill_bytes(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Next 32 keystream bits.
    pub fn next_u32(&mut self) -> Result<u32, RngError> {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    /// Next 64 keystream bits.
    pub fn next_u64(&mut self) -> Result<u64, RngError> {
        let mut buf = [0u8; 8];
        self.fill_bytes(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }
}

impl Drop for StreamGen {
    fn drop(&mut self) {
        self.a.zeroize();
        self.b.zeroize();
        self.c.zeroize();
        self.bytes_since_reseed = 0;
    }
}
