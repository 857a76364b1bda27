//! HMAC_DRBG (NIST SP 800-90A Section 10.1.2) using HMAC-SHA-512.

use zeroize::Zeroize;

use sysrand_types::{RngError, SHA512_DIGEST_LEN};

use crate::crypto::{self, HmacSha512};

/// HMAC output length in bytes.
pub const OUT_LEN: usize = SHA512_DIGEST_LEN;
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

/// HMAC_DRBG working state.
pub struct HmacDrbg {
    k: [u8; OUT_LEN],
    v: [u8; OUT_LEN],
    reseed_counter: u64,
    instantiated: bool,
}

impl HmacDrbg {
    /// Instantiate (SP 800-90A §10.1.2.3). The nonce is required.
    pub fn new(entropy: &[u8], nonce: &[u8], personalization: &[u8]) -> Result<Self, RngError> {
        if entropy.len() < MIN_ENTROPY_LEN || entropy.len() as u64 > MAX_ENTROPY_LEN {
            return Err(RngError::InvalidArgument);
        }
        if nonce.is_empty() || nonce.len() as u64 > MAX_NONCE_LEN {
            return Err(RngError::InvalidArgument);
        }
        if personalization.len() as u64 > MAX_PERS_LEN {
            return Err(RngError::InvalidArgument);
        }

        let mut drbg = HmacDrbg {
            k: [0x00; OUT_LEN],
            v: [0x01; OUT_LEN],
            reseed_counter: 0,
            instantiated: false,
        };
        drbg.update(&[entropy, nonce, personalization]);

        drbg.reseed_counter = 1;
        drbg.instantiated = true;
        Ok(drbg)
    }

    /// Update (SP 800-90A §10.1.2.2). `data` is the concatenation of the
    /// given parts; the second round runs only when it is non-empty.
    fn update(&mut self, data: &[&[u8]]) {
        let data_len: usize = data.iter().map(|d| d.len()).sum();

        // K = HMAC(K, V || 0x00 || data)
        let mut mac = HmacSha512::new(&self.k);
        mac.update(&self.v);
        mac.update(&[0x00]);
        for part in data {
            mac.update(part);
        }
        self.k = mac.finish();
        // V = HMAC(K, V)
        self.v = crypto::hmac_sha512(&self.k, &[&self.v]);

        if data_len == 0 {
            return;
        }

        // K = HMAC(K, V || 0x01 || data)
        let mut mac = HmacSha512::new(&self.k);
        mac.update(&self.v);
        mac.update(&[0x01]);
        for part in data {
            mac.update(part);
        }
        self.k = mac.finish();
        // V = HMAC(K, V)
        self.v = crypto::hmac_sha512(&self.k, &[&self.v]);
    }

    /// Reseed (SP 800-90A §10.1.2.4).
    pub fn reseed(&mut self, entropy: &[u8], additional_input: Option<&[u8]>) -> Result<(), RngError> {
        if !self.instantiated {
            return Err(RngError::NotInitialized);
        }
        if entropy.len() < MIN_ENTROPY_LEN || entropy.len() as u64 > MAX_ENTROPY_LEN {
            return Err(RngError::InvalidArgument);
        }
        let additional = additional_input.unwrap_or_default();
        if additional.len() as u64 > MAX_PERS_LEN {
            return Err(RngError::InvalidArgument);
        }

        self.update(&[entropy, additional]);
        self.reseed_counter = 1;
        Ok(())
    }

    /// Generate (SP 800-90A §10.1.2.5).
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
            self.update(&[additional]);
        }

        for chunk in output.chunks_mut(OUT_LEN) {
            self.v = crypto::hmac_sha512(&self.k, &[&self.v]);
            chunk.copy_from_slice(&self.v[..chunk.len()]);
        }

        // Post-update runs whether or not additional input was supplied.
        self.update(&[additional]);
        self.reseed_counter += 1;
        Ok(())
    }

    /// Scrub the entire state.
    pub fn clear(&mut self) {
        self.k.zeroize();
        self.v.zeroize();
        self.reseed_counter = 0;
        self.instantiated = false;
    }

    pub fn reseed_counter(&self) -> u64 {
        self.reseed_counter
    }

    #[cfg(test)]
    pub(crate) fn state_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.k);
        out.extend_from_slice(&self.v);
        out.extend_from_slice(&self.reseed_counter.to_be_bytes());
        out
    }

    #[cfg(test)]
    pub(crate) fn force_reseed_counter(&mut self, value: u64) {
        self.reseed_counter = value;
    }
}

impl Drop for HmacDrbg {
    fn drop(&mut self) {
        self.clear();
    }
}
