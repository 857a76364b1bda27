//! Deterministic Random Bit Generators (NIST SP 800-90A).
//!
//! Three mechanisms behind one capability set, tagged by
//! [`DrbgAlgorithm`]:
//! - CTR_DRBG, AES-256 without derivation function (Section 10.2)
//! - Hash_DRBG, SHA-512 (Section 10.1.1)
//! - HMAC_DRBG, SHA-512 (Section 10.1.2)

pub mod ctr;
pub mod hash;
pub mod hmac;

pub use ctr::CtrDrbg;
pub use hash::HashDrbg;
pub use hmac::HmacDrbg;

use sysrand_types::{DrbgAlgorithm, RngError};

use crate::rng;

/// The operation set shared by all three mechanisms.
pub trait Drbg: Send {
    /// Which mechanism this state belongs to.
    fn algorithm(&self) -> DrbgAlgorithm;

    /// Reseed from fresh entropy, with optional additional input.
    fn reseed(&mut self, entropy: &[u8], additional_input: Option<&[u8]>)
        -> Result<(), RngError>;

    /// Fill `output` with pseudorandom bytes.
    fn generate(&mut self, output: &mut [u8], additional_input: Option<&[u8]>)
        -> Result<(), RngError>;

    /// Generate requests since the last (re)seed.
    fn reseed_counter(&self) -> u64;

    /// Scrub the state.
    fn clear(&mut self);
}

impl Drbg for CtrDrbg {
    fn algorithm(&self) -> DrbgAlgorithm {
        DrbgAlgorithm::AesCtr256
    }
    fn reseed(&mut self, entropy: &[u8], additional_input: Option<&[u8]>)
        -> Result<(), RngError> {
        CtrDrbg::reseed(self, entropy, additional_input)
    }
    fn generate(&mut self, output: &mut [u8], additional_input: Option<&[u8]>)
        -> Result<(), RngError> {
        CtrDrbg::generate(self, output, additional_input)
    }
    fn reseed_counter(&self) -> u64 {
        CtrDrbg::reseed_counter(self)
    }
    fn clear(&mut self) {
        CtrDrbg::clear(self)
    }
}

impl Drbg for HashDrbg {
    fn algorithm(&self) -> DrbgAlgorithm {
        DrbgAlgorithm::HashSha512
    }
    fn reseed(&mut self, entropy: &[u8], additional_input: Option<&[u8]>)
        -> Result<(), RngError> {
        HashDrbg::reseed(self, entropy, additional_input)
    }
    fn generate(&mut self, output: &mut [u8], additional_input: Option<&[u8]>)
        -> Result<(), RngError> {
        HashDrbg::generate(self, output, additional_input)
    }
    fn reseed_counter(&self) -> u64 {
        HashDrbg::reseed_counter(self)
    }
    fn clear(&mut self) {
        HashDrbg::clear(self)
    }
}

impl Drbg for HmacDrbg {
    fn algorithm(&self) -> DrbgAlgorithm {
        DrbgAlgorithm::HmacSha512
    }
    fn reseed(&mut self, entropy: &[u8], additional_input: Option<&[u8]>)
        -> Result<(), RngError> {
        HmacDrbg::reseed(self, entropy, additional_input)
    }
    fn generate(&mut self, output: &mut [u8], additional_input: Option<&[u8]>)
        -> Result<(), RngError> {
        HmacDrbg::generate(self, output, additional_input)
    }
    fn reseed_counter(&self) -> u64 {
        HmacDrbg::reseed_counter(self)
    }
    fn clear(&mut self) {
        HmacDrbg::clear(self)
    }
}

/// Instantiate a mechanism from caller-supplied seed material.
///
/// CTR_DRBG takes no nonce (the no-df variant folds everything into the
/// 48-byte entropy input); passing one is an argument error.
pub fn instantiate(
    algorithm: DrbgAlgorithm,
    entropy: &[u8],
    nonce: &[u8],
    personalization: &[u8],
) -> Result<Box<dyn Drbg>, RngError> {
    match algorithm {
        DrbgAlgorithm::AesCtr256 => {
            if !nonce.is_empty() {
                return Err(RngError::InvalidArgument);
            }
            Ok(Box::new(CtrDrbg::new(entropy, personalization)?))
        }
        DrbgAlgorithm::HashSha512 => {
            Ok(Box::new(HashDrbg::new(entropy, nonce, personalization)?))
        }
        DrbgAlgorithm::HmacSha512 => {
            Ok(Box::new(HmacDrbg::new(entropy, nonce, personalization)?))
        }
    }
}

/// Instantiate a mechanism seeded from the running entropy pool.
///
/// The pool must have been started ([`crate::rng::start`]) and will be
/// slow-polled by the seed fetch.
pub fn from_pool(
    algorithm: DrbgAlgorithm,
    personalization: &[u8],
) -> Result<Box<dyn Drbg>, RngError> {
    use zeroize::Zeroize;

    match algorithm {
        DrbgAlgorithm::AesCtr256 => {
            let mut entropy = [0u8; ctr::SEED_LEN];
            rng::fetch_bytes(&mut entropy, true)?;
            let result = CtrDrbg::new(&entropy, personalization);
            entropy.zeroize();
            Ok(Box::new(result?))
        }
        DrbgAlgorithm::HashSha512 | DrbgAlgorithm::HmacSha512 => {
            let mut seed = [0u8; 96];
            rng::fetch_bytes(&mut seed, true)?;
            let (entropy, nonce) = seed.split_at(64);
            let result = instantiate(algorithm, entropy, nonce, personalization);
            seed.zeroize();
            result
        }
    }
}
