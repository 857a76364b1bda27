//! CTR_DRBG (NIST SP 800-90A Section 10.2) using AES-256, without a
//! derivation function.
//!
//! The counter lives in the last 32 bits of `V`, big-endian; carries do
//! not propagate into the upper 96 bits (the `ctr_len = 32` variant of
//! the standard).

use zeroize::Zeroize;

use sysrand_types::{RngError, AES256_KEY_LEN, AES_BLOCK_LEN};

use crate::crypto;

/// Seed length: key plus one block (48 bytes for AES-256).
pub const SEED_LEN: usize = AES256_KEY_LEN + AES_BLOCK_LEN;
/// Maximum bytes per generate request.
pub const MAX_OUT_LEN: usize = 1 << 16;
/// Maximum generate requests between reseeds.
pub const MAX_RESEED_COUNT: u64 = 1 << 48;

/// CTR_DRBG working state.
pub struct CtrDrbg {
    key: [u8; AES256_KEY_LEN],
    v: [u8; AES_BLOCK_LEN],
    reseed_counter: u64,
}

/// Add one to the low 32 bits of the counter block, big-endian, without
/// carrying into the upper 96 bits.
fn incr32(v: &mut [u8; AES_BLOCK_LEN]) {
    let mut tail = [0u8; 4];
    tail.copy_from_slice(&v[AES_BLOCK_LEN - 4..]);
    let next = u32::from_be_bytes(tail).wrapping_add(1);
    v[AES_BLOCK_LEN - 4..].copy_from_slice(&next.to_be_bytes());
}

impl CtrDrbg {
    /// Instantiate (SP 800-90A §10.2.1.3.1).
    ///
    /// `entropy` must be exactly [`SEED_LEN`] bytes; `personalization`
    /// may be up to [`SEED_LEN`] bytes and is XORed over the entropy.
    pub fn new(entropy: &[u8], personalization: &[u8]) -> Result<Self, RngError> {
        if entropy.len() != SEED_LEN || personalization.len() > SEED_LEN {
            return Err(RngError::InvalidArgument);
        }

        let mut seed_material = [0u8; SEED_LEN];
        seed_material.copy_from_slice(entropy);
        for (s, p) in seed_material.iter_mut().zip(personalization.iter()) {
            *s ^= p;
        }

        let mut drbg = CtrDrbg {
            key: [0u8; AES256_KEY_LEN],
            v: [0u8; AES_BLOCK_LEN],
            reseed_counter: 0,
        };
        drbg.update(&seed_material);
        seed_material.zeroize();

        drbg.reseed_counter = 1;
        Ok(drbg)
    }

    /// Update (SP 800-90A §10.2.1.2). `data` must be at most `SEED_LEN`
    /// bytes; missing bytes act as zeros.
    fn update(&mut self, data: &[u8]) {
        debug_assert!(data.len() <= SEED_LEN);

        let mut temp = [0u8; SEED_LEN];
        for chunk in temp.chunks_mut(AES_BLOCK_LEN) {
            incr32(&mut self.v);
            chunk.copy_from_slice(&crypto::aes256_encrypt_block(&self.key, &self.v));
        }

        for (t, d) in temp.iter_mut().zip(data.iter()) {
            *t ^= d;
        }

        self.key.copy_from_slice(&temp[..AES256_KEY_LEN]);
        self.v.copy_from_slice(&temp[AES256_KEY_LEN..]);
        temp.zeroize();
    }

    /// Reseed (SP 800-90A §10.2.1.4.1).
    pub fn reseed(&mut self, entropy: &[u8], additional_input: Option<&[u8]>) -> Result<(), RngError> {
        let additional = additional_input.unwrap_or_default();
        if entropy.len() != SEED_LEN || additional.len() > SEED_LEN {
            return Err(RngError::InvalidArgument);
        }

        let mut seed_material = [0u8; SEED_LEN];
        seed_material.copy_from_slice(entropy);
        for (s, a) in seed_material.iter_mut().zip(additional.iter()) {
            *s ^= a;
        }

        self.update(&seed_material);
        seed_material.zeroize();

        self.reseed_counter = 1;
        Ok(())
    }

    /// Generate (SP 800-90A §10.2.1.5.1).
    pub fn generate(
        &mut self,
        output: &mut [u8],
        additional_input: Option<&[u8]>,
    ) -> Result<(), RngError> {
        let additional = additional_input.unwrap_or_default();
        if output.len() > MAX_OUT_LEN || additional.len() > SEED_LEN {
            return Err(RngError::InvalidArgument);
        }
        if self.reseed_counter > MAX_RESEED_COUNT {
            return Err(RngError::DrbgReseedRequired);
        }

        // The zero-padded additional input is reused for the
        // backtracking-resistance update below.
        let mut add_input = [0u8; SEED_LEN];
        add_input[..additional.len()].copy_from_slice(additional);
        if !additional.is_empty() {
            self.update(&add_input);
        }

        for chunk in output.chunks_mut(AES_BLOCK_LEN) {
            incr32(&mut self.v);
            let mut block = crypto::aes256_encrypt_block(&self.key, &self.v);
            chunk.copy_from_slice(&block[..chunk.len()]);
            block.zeroize();
        }

        self.update(&add_input);
        add_input.zeroize();

        self.reseed_counter += 1;
        Ok(())
    }

    /// Scrub the entire state.
    pub fn clear(&mut self) {
        self.key.zeroize();
        self.v.zeroize();
        self.reseed_counter = 0;
    }

    pub fn reseed_counter(&self) -> u64 {
        self.reseed_counter
    }

    #[cfg(test)]
    pub(crate) fn state_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.key);
        out.extend_from_slice(&self.v);
        out.extend_from_slice(&self.reseed_counter.to_be_bytes());
        out
    }

    #[cfg(test)]
    pub(crate) fn force_reseed_counter(&mut self, value: u64) {
        self.reseed_counter = value;
    }
}

impl Drop for CtrDrbg {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instantiate_requires_exact_entropy() {
        assert!(CtrDrbg::new(&[0u8; 32], &[]).is_err());
        assert!(CtrDrbg::new(&[0u8; 49], &[]).is_err());
        assert!(CtrDrbg::new(&[0u8; SEED_LEN], &[0u8; SEED_LEN + 1]).is_err());
        let drbg = CtrDrbg::new(&[0u8; SEED_LEN], &[]).unwrap();
        assert_eq!(drbg.reseed_counter(), 1);
    }

    #[test]
    fn test_incr32_does_not_carry_past_32_bits() {
        let mut v = [0u8; AES_BLOCK_LEN];
        v[11] = 0xaa;
        for b in v[12..].iter_mut() {
            *b = 0xff;
        }
        incr32(&mut v);
        assert_eq!(&v[12..], &[0, 0, 0, 0]);
        // Upper 96 bits untouched.
        assert_eq!(v[11], 0xaa);
    }

    #[test]
    fn test_generate_deterministic_from_seed() {
        let seed = [0x42u8; SEED_LEN];
        let mut a = CtrDrbg::new(&seed, &[]).unwrap();
        let mut b = CtrDrbg::new(&seed, &[]).unwrap();

        let mut out_a = [0u8; 64];
        let mut out_b = [0u8; 64];
        a.generate(&mut out_a, None).unwrap();
        b.generate(&mut out_b, None).unwrap();
        assert_eq!(out_a, out_b);

        a.generate(&mut out_a, None).unwrap();
        assert_ne!(out_a, out_b);
    }

    #[test]
    fn test_personalization_diversifies() {
        let seed = [0x42u8; SEED_LEN];
        let mut a = CtrDrbg::new(&seed, &[]).unwrap();
        let mut b = CtrDrbg::new(&seed, b"instance two").unwrap();

        let mut out_a = [0u8; 32];
        let mut out_b = [0u8; 32];
        a.generate(&mut out_a, None).unwrap();
        b.generate(&mut out_b, None).unwrap();
        assert_ne!(out_a, out_b);
    }

    #[test]
    fn test_generate_error_surface() {
        let mut drbg = CtrDrbg::new(&[0u8; SEED_LEN], &[]).unwrap();

        let mut oversized = vec![0u8; MAX_OUT_LEN + 1];
        assert!(matches!(
            drbg.generate(&mut oversized, None),
            Err(RngError::InvalidArgument)
        ));

        let mut out = [0u8; 16];
        assert!(matches!(
            drbg.generate(&mut out, Some(&[0u8; SEED_LEN + 1])),
            Err(RngError::InvalidArgument)
        ));

        drbg.force_reseed_counter(MAX_RESEED_COUNT + 1);
        assert!(matches!(
            drbg.generate(&mut out, None),
            Err(RngError::DrbgReseedRequired)
        ));

        // Reseed recovers.
        drbg.reseed(&[0x11u8; SEED_LEN], None).unwrap();
        assert_eq!(drbg.reseed_counter(), 1);
        drbg.generate(&mut out, None).unwrap();
    }

    #[test]
    fn test_failed_generate_leaves_state_unchanged() {
        let mut drbg = CtrDrbg::new(&[0x37u8; SEED_LEN], &[]).unwrap();
        let mut expected = [0u8; 32];
        {
            let mut probe = CtrDrbg::new(&[0x37u8; SEED_LEN], &[]).unwrap();
            probe.generate(&mut expected, None).unwrap();
        }

        let mut oversized = vec![0u8; MAX_OUT_LEN + 1];
        assert!(drbg.generate(&mut oversized, None).is_err());

        let mut out = [0u8; 32];
        drbg.generate(&mut out, None).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_reseed_counter_monotonic() {
        let mut drbg = CtrDrbg::new(&[0u8; SEED_LEN], &[]).unwrap();
        let mut out = [0u8; 16];
        for expected in 1..6u64 {
            assert_eq!(drbg.reseed_counter(), expected);
            drbg.generate(&mut out, None).unwrap();
        }
        drbg.reseed(&[0u8; SEED_LEN], None).unwrap();
        assert_eq!(drbg.reseed_counter(), 1);
    }

    #[test]
    fn test_backtracking_update_runs_without_additional_input() {
        // Same seed, one generates 16 bytes twice, the other 32 bytes
        // once: outputs must diverge after the first call because of the
        // post-generate update.
        let seed = [0x99u8; SEED_LEN];
        let mut split = CtrDrbg::new(&seed, &[]).unwrap();
        let mut whole = CtrDrbg::new(&seed, &[]).unwrap();

        let mut first = [0u8; 16];
        let mut second = [0u8; 16];
        split.generate(&mut first, None).unwrap();
        split.generate(&mut second, None).unwrap();

        let mut joined = [0u8; 32];
        whole.generate(&mut joined, None).unwrap();

        assert_eq!(&joined[..16], &first);
        assert_ne!(&joined[16..], &second);
    }

    #[test]
    fn test_clear_zeroizes_state() {
        let mut drbg = CtrDrbg::new(&[0xabu8; SEED_LEN], &[]).unwrap();
        let mut out = [0u8; 32];
        drbg.generate(&mut out, None).unwrap();
        assert!(drbg.state_bytes().iter().any(|&b| b != 0));

        drbg.clear();
        assert!(drbg.state_bytes().iter().all(|&b| b == 0));
    }
}
