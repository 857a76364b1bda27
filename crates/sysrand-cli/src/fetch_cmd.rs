//! Fetch bytes from the entropy pool and print them as hex.

use sysrand_core::{pool, rng};

pub fn run(num: usize) -> Result<(), Box<dyn std::error::Error>> {
    if num == 0 || num > pool::POOL_SIZE {
        return Err(format!("num must be between 1 and {}", pool::POOL_SIZE).into());
    }

    if !rng::start() {
        return Err("generator failed to start".into());
    }

    let mut buf = vec![0u8; num];
    let fetched = rng::fetch(&mut buf);
    if !fetched {
        rng::stop();
        return Err("fetch failed".into());
    }

    println!("{}", crate::hex_encode(&buf));
    rng::stop();
    Ok(())
}
