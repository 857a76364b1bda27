//! OS cryptographic RNG probe.

use sysrand_types::RngError;

use super::SystemRng;

/// The operating system's randomness provider, via `getrandom`.
pub struct OsSystemRng;

impl SystemRng for OsSystemRng {
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), RngError> {
        getrandom::getrandom(buf).map_err(|e| {
            log::warn!("system rng failed: {e}");
            RngError::EntropySourceFailed
        })
    }
}
