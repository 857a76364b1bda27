//! Algorithm identifiers and per-mechanism size parameters.

/// SHA-512 digest length in bytes.
pub const SHA512_DIGEST_LEN: usize = 64;

/// AES block size in bytes.
pub const AES_BLOCK_LEN: usize = 16;

/// AES-256 key size in bytes.
pub const AES256_KEY_LEN: usize = 32;

/// DRBG mechanism selection (NIST SP 800-90A).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrbgAlgorithm {
    /// CTR_DRBG with AES-256, no derivation function (Section 10.2).
    AesCtr256,
    /// Hash_DRBG with SHA-512 (Section 10.1.1).
    HashSha512,
    /// HMAC_DRBG with SHA-512 (Section 10.1.2).
    HmacSha512,
}

impl DrbgAlgorithm {
    /// Entropy input length this mechanism is seeded with, in bytes.
    pub fn seed_len(self) -> usize {
        match self {
            Self::AesCtr256 => AES256_KEY_LEN + AES_BLOCK_LEN,
            Self::HashSha512 | Self::HmacSha512 => SHA512_DIGEST_LEN,
        }
    }

    /// Short name used in logs and the CLI.
    pub fn name(self) -> &'static str {
        match self {
            Self::AesCtr256 => "ctr-aes256",
            Self::HashSha512 => "hash-sha512",
            Self::HmacSha512 => "hmac-sha512",
        }
    }
}

impl std::str::FromStr for DrbgAlgorithm {
    type Err = crate::RngError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ctr" | "ctr-aes256" => Ok(Self::AesCtr256),
            "hash" | "hash-sha512" => Ok(Self::HashSha512),
            "hmac" | "hmac-sha512" => Ok(Self::HmacSha512),
            _ => Err(crate::RngError::InvalidArgument),
        }
    }
}
