//! Hash_DRBG (NIST SP 800-90A Section 10.1.1) using SHA-512.
//!
//! State arithmetic on `V` is byte-wise modular addition over the
//! 111-byte seed length in big-endian layout, carrying from the
//! least-significant byte.

use zeroize::Zeroize;

use sysrand_types::{RngError, SHA512_DIGEST_LEN};

use crate::crypto;

/// Seed length for SHA-512 (SP 800-90A Table 2).
pub const SEED_LEN: usize = 111;
/// Minimum entropy input length in bytes.
pub const MIN_ENTROPY_LEN: usize = 32;
/// Maximum entropy input length in bytes.
pub const MAX_ENTROPY_LEN: u64 = 1 << 32;
/// Maximum nonce length in bytes.
pub const MAX_NONCE_LEN: u64 = 1 << 16;
/// Maximum personalization string / additional input length in bytes.
pub const MAX_PERS_LEN: u64 = 1 << 32;
/// Maximum bytes per generate request.
pub const MAX_OUT_LEN: usize = 1 << 16;
/// Maximum generate requests between reseeds.
pub const MAX_RESEED_COUNT: u64 = 1 << 48;

/// Hash_DRBG working state.
pub struct HashDrbg {
    v: [u8; SEED_LEN],
    c: [u8; SEED_LEN],
    reseed_counter: u64,
    instantiated: bool,
}

/// Hash_df (SP 800-90A §10.3.1): counter-mode derivation producing
/// `out_len` bytes from the concatenation of `parts`.
pub fn hash_df(parts: &[&[u8]], out_len: usize) -> Result<Vec<u8>, RngError> {
    if out_len > 255 * SHA512_DIGEST_LEN {
        return Err(RngError::InvalidArgument);
    }

    let bits = (out_len as u32) * 8;
    let bits_be = bits.to_be_bytes();

    let mut out = Vec::with_capacity(out_len + SHA512_DIGEST_LEN);
    let mut counter: u8 = 1;
    while out.len() < out_len {
        let mut hasher_parts: Vec<&[u8]> = Vec::with_capacity(parts.len() + 2);
        let counter_byte = [counter];
        hasher_parts.push(&counter_byte);
        hasher_parts.push(&bits_be);
        hasher_parts.extend_from_slice(parts);

        let digest = crypto::sha512_parts(&hasher_parts);
        out.extend_from_slice(&digest);
        counter = counter.wrapping_add(1);
    }

    out.truncate(out_len);
    Ok(out)
}

/// `v = (v + addend) mod 2^(8 * v.len())`, both big-endian.
fn v_add(v: &mut [u8], addend: &[u8]) {
    let vlen = v.len();
    let alen = addend.len();
    let mut carry: u16 = 0;
    for i in (0..vlen).rev() {
        let a = if i + alen >= vlen {
            addend[i + alen - vlen] as u16
        } else {
            0
        };
        let sum = v[i] as u16 + a + carry;
        v[i] = sum as u8;
        carry = sum >> 8;
    }
}

/// `v = (v + value) mod 2^(8 * v.len())`.
fn v_add_u64(v: &mut [u8], value: u64) {
    v_add(v, &value.to_be_bytes());
}

fn check_entropy(entropy: &[u8]) -> Result<(), RngError> {
    if entropy.len() < MIN_ENTROPY_LEN || entropy.len() as u64 > MAX_ENTROPY_LEN {
        return Err(RngError::InvalidArgument);
    }
    Ok(())
}

impl HashDrbg {
    /// Instantiate (SP 800-90A §10.1.1.2). The nonce is required.
    pub fn new(entropy: &[u8], nonce: &[u8], personalization: &[u8]) -> Result<Self, RngError> {
        check_entropy(entropy)?;
        if nonce.is_empty() || nonce.len() as u64 > MAX_NONCE_LEN {
            return Err(RngError::InvalidArgument);
        }
        if personalization.len() as u64 > MAX_PERS_LEN {
            return Err(RngError::InvalidArgument);
        }

        let mut drbg = HashDrbg {
            v: [0u8; SEED_LEN],
            c: [0u8; SEED_LEN],
            reseed_counter: 0,
            instantiated: false,
        };

        let mut seed = hash_df(&[entropy, nonce, personalization], SEED_LEN)?;
        drbg.v.copy_from_slice(&seed);
        seed.zeroize();
        drbg.recompute_c()?;

        drbg.reseed_counter = 1;
        drbg.instantiated = true;
        Ok(drbg)
    }

    /// `C = Hash_df(0x00 || V, seedlen)`.
    fn recompute_c(&mut self) -> Result<(), RngError> {
        let mut c = hash_df(&[&[0x00], &self.v], SEED_LEN)?;
        self.c.copy_from_slice(&c);
        c.zeroize();
        Ok(())
    }

    /// Reseed (SP 800-90A §10.1.1.3).
    pub fn reseed(&mut self, entropy: &[u8], additional_input: Option<&[u8]>) -> Result<(), RngError> {
        if !self.instantiated {
            return Err(RngError::NotInitialized);
        }
        check_entropy(entropy)?;
        let additional = additional_input.unwrap_or_default();
        if additional.len() as u64 > MAX_PERS_LEN {
            return Err(RngError::InvalidArgument);
        }

        let mut seed = hash_df(&[&[0x01], &self.v, entropy, additional], SEED_LEN)?;
        self.v.copy_from_slice(&seed);
        seed.zeroize();
        self.recompute_c()?;

        self.reseed_counter = 1;
        Ok(())
    }

    /// Hashgen (SP 800-90A §10.1.1.4 step 11).
    fn hashgen(&self, output: &mut [u8]) {
        let mut data = self.v;
        for chunk in output.chunks_mut(SHA512_DIGEST_LEN) {
            let mut digest = crypto::sha512(&data);
            chunk.copy_from_slice(&digest[..chunk.len()]);
            digest.zeroize();
            v_add_u64(&mut data, 1);
        }
        data.zeroize();
    }

    /// Generate (SP 800-90A §10.1.1.4).
    pub fn generate(
        &mut self,
        output: &mut [u8],
        additional_input: Option<&[u8]>,
    ) -> Result<(), RngError> {
        if !self.instantiated {
            return Err(RngError::NotInitialized);
        }
        if output.len() > MAX_OUT_LEN {
            return Err(RngError::InvalidArgument);
        }
        let additional = additional_input.unwrap_or_default();
        if additional.len() as u64 > MAX_PERS_LEN {
            return Err(RngError::InvalidArgument);
        }
        if self.reseed_counter > MAX_RESEED_COUNT {
            return Err(RngError::DrbgReseedRequired);
        }

        if !additional.is_empty() {
            let mut w = crypto::sha512_parts(&[&[0x02], &self.v, additional]);
            v_add(&mut self.v, &w);
            w.zeroize();
        }

        self.hashgen(output);

        let mut h = crypto::sha512_parts(&[&[0x03], &self.v]);
        v_add(&mut self.v, &h);
        h.zeroize();
        v_add(&mut self.v, &self.c);
        v_add_u64(&mut self.v, self.reseed_counter);

        self.reseed_counter += 1;
        Ok(())
    }

    /// Scrub the entire state.
    pub fn clear(&mut self) {
        self.v.zeroize();
        self.c.zeroize();
        self.reseed_counter = 0;
        self.instantiated = false;
    }

    pub fn reseed_counter(&self) -> u64 {
        self.reseed_counter
    }

    #[cfg(test)]
    pub(crate) fn state_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.v);
        out.extend_from_slice(&self.c);
        out.extend_from_slice(&self.reseed_counter.to_be_bytes());
        out
    }

    #[cfg(test)]
    pub(crate) fn force_reseed_counter(&mut self, value: u64) {
        self.reseed_counter = value;
    }
}

impl Drop for HashDrbg {
    fn drop(&mut self) {
        self.clear();
    }
}
