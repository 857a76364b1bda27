#![doc = "Cryptographically secure random-number subsystem."]
//!
//! Two cooperating services:
//!
//! - an **entropy pool** that XOR-accumulates contributions from many
//!   heterogeneous system probes, diffuses them with SHA-512, and serves
//!   high-strength seed material ([`rng`], [`pool`], [`collector`],
//!   [`probes`]);
//! - a family of **SP 800-90A DRBGs** (CTR/AES-256 without derivation
//!   function, Hash/SHA-512, HMAC/SHA-512) seeded from the pool and
//!   producing bulk pseudorandom output with reseed discipline and
//!   backtracking resistance ([`drbg`]);
//!
//! plus a lightweight Trivium-style keystream generator ([`stream`]) for
//! consumers that trade strength for speed.
//!
//! # Example
//!
//! ```no_run
//! let started = sysrand_core::rng::start();
//! assert!(started);
//!
//! let mut seed = [0u8; 64];
//! assert!(sysrand_core::rng::fetch(&mut seed));
//!
//! sysrand_core::rng::stop();
//! ```

pub mod collector;
pub mod crc32;
pub mod crypto;
pub mod drbg;
pub mod pool;
pub mod probes;
pub mod rng;
pub mod stream;

pub use sysrand_types::{err_string, DrbgAlgorithm, RngError};
