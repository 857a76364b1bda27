//! Timing-jitter entropy collector.
//!
//! Harvests unpredictability from execution-time variance: cache and TLB
//! misses, pipeline stalls, interrupts, and scheduler noise observed
//! through a high-resolution timestamp. Each output bit is the parity of
//! `8 * osr` folded timing deltas.

use sysrand_types::RngError;

use super::{read_tsc, TimingJitter};

/// Timing-jitter collector.
pub struct JitterRng {
    _private: (),
}

impl JitterRng {
    pub fn new() -> Self {
        JitterRng { _private: () }
    }

    #[inline(always)]
    fn timestamp() -> u64 {
        match read_tsc() {
            Some(t) => t,
            // No counter instruction; fall back to the OS monotonic clock.
            None => super::perf_counter_nanos(),
        }
    }

    /// A small amount of memory-touching work between samples.
    #[inline(always)]
    fn stir(scratch: &mut [u64; 16]) {
        let mut acc = 0u64;
        for (i, slot) in scratch.iter_mut().enumerate() {
            acc = acc.wrapping_add(*slot).rotate_left((i as u32) & 63);
            *slot ^= acc;
            core::hint::black_box(*slot);
        }
    }
}

impl Default for JitterRng {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingJitter for JitterRng {
    fn read(&mut self, buf: &mut [u8], osr: u32) -> Result<usize, RngError> {
        let osr = osr.max(1);

        // Verify the timer advances at all before trusting any deltas.
        let t1 = Self::timestamp();
        let mut scratch = [0u64; 16];
        Self::stir(&mut scratch);
        let t2 = Self::timestamp();
        if t1 == t2 {
            log::warn!("jitter collector: timestamp source does not advance");
            return Err(RngError::EntropySourceFailed);
        }

        let mut stuck = true;
        let mut prev_delta = 0u64;

        for byte in buf.iter_mut() {
            let mut acc = 0u8;
            for _ in 0..8 {
                let mut folded = 0u64;
                for _ in 0..8 * osr {
                    let start = Self::timestamp();
                    Self::stir(&mut scratch);
                    let end = Self::timestamp();
                    let delta = end.wrapping_sub(start);
                    if delta != prev_delta {
                        stuck = false;
                    }
                    prev_delta = delta;
                    folded ^= delta;
                }
                let bit = (folded.count_ones() & 1) as u8;
                acc = (acc << 1) | bit;
            }
            *byte = acc;
        }

        // A source that produced one identical delta throughout carries
        // no entropy; treat it as failed rather than returning the bytes.
        if stuck && !buf.is_empty() {
            log::warn!("jitter collector: timing deltas are constant");
            return Err(RngError::EntropySourceFailed);
        }

        Ok(buf.len())
    }
}
