//! Thin wrappers over the external hash and block-cipher primitives.
//!
//! SHA-512 and AES-256 come from the `sha2` and `aes` crates; HMAC-SHA-512
//! is built here over SHA-512 (RFC 2104). The DRBGs and the pool mixer go
//! through these helpers so the primitive choice stays in one place.

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes256;
use sha2::{Digest, Sha512};
use zeroize::Zeroize;

use sysrand_types::{AES256_KEY_LEN, AES_BLOCK_LEN, SHA512_DIGEST_LEN};

/// SHA-512 internal block size in bytes.
const SHA512_BLOCK_LEN: usize = 128;

/// One-shot SHA-512.
pub fn sha512(data: &[u8]) -> [u8; SHA512_DIGEST_LEN] {
    let mut out = [0u8; SHA512_DIGEST_LEN];
    out.copy_from_slice(&Sha512::digest(data));
    out
}

/// Streaming SHA-512 over multiple input parts.
pub fn sha512_parts(parts: &[&[u8]]) -> [u8; SHA512_DIGEST_LEN] {
    let mut h = Sha512::new();
    for part in parts {
        h.update(part);
    }
    let mut out = [0u8; SHA512_DIGEST_LEN];
    out.copy_from_slice(&h.finalize());
    out
}

/// AES-256 single-block encryption.
pub fn aes256_encrypt_block(
    key: &[u8; AES256_KEY_LEN],
    block: &[u8; AES_BLOCK_LEN],
) -> [u8; AES_BLOCK_LEN] {
    let cipher = Aes256::new(GenericArray::from_slice(key));
    let mut buf = GenericArray::clone_from_slice(block);
    cipher.encrypt_block(&mut buf);
    let mut out = [0u8; AES_BLOCK_LEN];
    out.copy_from_slice(&buf);
    out
}

/// Streaming HMAC-SHA-512 context.
pub struct HmacSha512 {
    inner: Sha512,
    opad_key: [u8; SHA512_BLOCK_LEN],
}

impl HmacSha512 {
    /// Initialize with the given key. Keys longer than the SHA-512 block
    /// are hashed first; shorter keys are zero-padded.
    pub fn new(key: &[u8]) -> Self {
        let mut key_block = [0u8; SHA512_BLOCK_LEN];
        if key.len() > SHA512_BLOCK_LEN {
            key_block[..SHA512_DIGEST_LEN].copy_from_slice(&sha512(key));
        } else {
            key_block[..key.len()].copy_from_slice(key);
        }

        let mut ipad_key = [0u8; SHA512_BLOCK_LEN];
        let mut opad_key = [0u8; SHA512_BLOCK_LEN];
        for i in 0..SHA512_BLOCK_LEN {
            ipad_key[i] = key_block[i] ^ 0x36;
            opad_key[i] = key_block[i] ^ 0x5c;
        }
        key_block.zeroize();

        let mut inner = Sha512::new();
        inner.update(ipad_key);
        ipad_key.zeroize();

        HmacSha512 { inner, opad_key }
    }

    /// Feed message data.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalize and return the 64-byte tag.
    pub fn finish(mut self) -> [u8; SHA512_DIGEST_LEN] {
        let inner_hash = self.inner.finalize_reset();
        let mut outer = Sha512::new();
        outer.update(self.opad_key);
        outer.update(inner_hash);
        self.opad_key.zeroize();

        let mut out = [0u8; SHA512_DIGEST_LEN];
        out.copy_from_slice(&outer.finalize());
        out
    }
}

/// One-shot HMAC-SHA-512 over multiple message parts.
pub fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> [u8; SHA512_DIGEST_LEN] {
    let mut ctx = HmacSha512::new(key);
    for part in parts {
        ctx.update(part);
    }
    ctx.finish()
}
