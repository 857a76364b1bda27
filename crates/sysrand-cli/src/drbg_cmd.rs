//! Generate bytes from a pool-seeded DRBG and print them as hex.

use sysrand_core::{drbg, rng};
use sysrand_types::DrbgAlgorithm;

/// Per-call cap of every mechanism (SP 800-90A).
const MAX_PER_CALL: usize = 1 << 16;

pub fn run(
    algorithm: &str,
    num: usize,
    personalization: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    if num == 0 || num > 16 * 1024 * 1024 {
        return Err("num must be between 1 and 16777216".into());
    }
    let algorithm: DrbgAlgorithm = algorithm
        .parse()
        .map_err(|_| format!("unknown algorithm: {algorithm} (use ctr, hash, or hmac)"))?;

    if !rng::start() {
        return Err("generator failed to start".into());
    }

    let pers = personalization.map(str::as_bytes).unwrap_or_default();
    let mut state = match drbg::from_pool(algorithm, pers) {
        Ok(state) => state,
        Err(e) => {
            rng::stop();
            return Err(e.into());
        }
    };

    let mut out = vec![0u8; num];
    for chunk in out.chunks_mut(MAX_PER_CALL) {
        if let Err(e) = state.generate(chunk, None) {
            rng::stop();
            return Err(e.into());
        }
    }

    println!("{}", crate::hex_encode(&out));
    state.clear();
    rng::stop();
    Ok(())
}
