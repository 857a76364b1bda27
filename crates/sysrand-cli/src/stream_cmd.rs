//! Emit keystream bytes from the pool-reseeded stream generator.

use sysrand_core::{rng, stream::StreamGen};

pub fn run(num: usize) -> Result<(), Box<dyn std::error::Error>> {
    if num == 0 || num > 16 * 1024 * 1024 {
        return Err("num must be between 1 and 16777216".into());
    }

    if !rng::start() {
        return Err("generator failed to start".into());
    }

    let result = StreamGen::from_pool().and_then(|mut gen| {
        let mut out = vec![0u8; num];
        gen.fill_bytes(&mut out)?;
        Ok(out)
    });

    match result {
        Ok(out) => {
            println!("{}", crate::hex_encode(&out));
            rng::stop();
            Ok(())
        }
        Err(e) => {
            rng::stop();
            Err(e.into())
        }
    }
}
