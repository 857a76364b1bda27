//! Probe orchestration: fast polls, slow polls, and user-event capture.
//!
//! Failure policy: inside a fast poll only the OS RNG is load-bearing —
//! any other probe that comes up empty is logged and skipped. Inside a
//! slow poll the timing-jitter collector is additionally required, and
//! strict mode escalates skipped OS-statistics probes to a poll failure.

use zeroize::Zeroize;

use sysrand_types::RngError;

use crate::crc32::crc32;
use crate::pool::Pool;
use crate::probes::{self, Probes};

/// User-event capture ends after this many distinct events; enough for
/// the added words to cover the whole pool at least once.
const USER_EVENT_TARGET: usize = 256;

/// A captured user-input event: opaque event bytes plus a millisecond
/// timestamp. Producing these (input hooks, device taps) is platform glue
/// outside the core.
pub struct UserEvent {
    pub payload: Vec<u8>,
    pub timestamp_ms: u64,
}

/// Source of user-input events, drained during fetch when enabled.
pub trait UserEventSource: Send {
    /// Next event, blocking as needed. `None` means the source is closed.
    fn next_event(&mut self) -> Option<UserEvent>;
}

/// Gathers probe output into the pool.
pub struct Collector {
    probes: Probes,
    strict_checks: bool,
    added_startup_info: bool,
    user_events: Option<Box<dyn UserEventSource>>,
}

impl Collector {
    pub fn new(probes: Probes) -> Self {
        Collector {
            probes,
            strict_checks: false,
            added_startup_info: false,
            user_events: None,
        }
    }

    /// Escalate skipped OS-statistics probes to slow-poll failures.
    pub fn set_strict_checks(&mut self, on: bool) {
        self.strict_checks = on;
    }

    /// Install a user-event source; fetches will drain it until the
    /// capture target is reached.
    pub fn set_user_event_source(&mut self, source: Box<dyn UserEventSource>) {
        self.user_events = Some(source);
    }

    /// Remove and drop the installed user-event source.
    pub fn clear_user_event_source(&mut self) {
        self.user_events = None;
    }

    /// A quick, inexpensive round of probe reads. Fails only if the OS
    /// RNG fails. Ends with a pool mix.
    pub fn fast_poll(&mut self, pool: &mut Pool) -> Result<(), RngError> {
        let mut buf = [0u8; 16];
        self.probes.system_rng.fill(&mut buf)?;
        pool.add_bytes(&buf);
        buf.zeroize();

        // Up to 16 bytes each from the on-chip seed and rand sources.
        for _ in 0..2 {
            if let Some(x) = self.probes.cpu_rng.seed64() {
                pool.add_u64(x);
            }
        }
        for _ in 0..2 {
            if let Some(x) = self.probes.cpu_rng.rand64() {
                pool.add_u64(x);
            }
        }

        for id in self.probes.os_stats.process_ids() {
            pool.add_u64(id);
        }

        skip_or_add(pool, "window-system ids", self.probes.os_stats.window_system_ids());
        skip_or_add(pool, "pointer state", self.probes.os_stats.pointer_state());
        skip_or_add(pool, "memory status", self.probes.os_stats.memory_status());
        skip_or_add(pool, "cpu times", self.probes.os_stats.cpu_times());
        skip_or_add(pool, "working set", self.probes.os_stats.working_set());

        pool.add_u64(probes::wall_clock_nanos());
        pool.add_u64(probes::perf_counter_nanos());
        if let Some(tsc) = probes::read_tsc() {
            pool.add_u64(tsc);
        }

        pool.mix();
        Ok(())
    }

    /// An exhaustive round of probe reads, required at least once before
    /// the pool serves output. Fails if the timing-jitter collector
    /// fails, and in strict mode if any OS statistic is unavailable.
    /// Ends with a pool mix.
    pub fn slow_poll(&mut self, pool: &mut Pool) -> Result<(), RngError> {
        if !self.added_startup_info {
            match self.probes.os_stats.startup_info() {
                Some(snap) => {
                    pool.add_bytes(&snap);
                    self.added_startup_info = true;
                }
                None => self.skip_or_fail("startup info")?,
            }
        }

        let mut jitter_buf = [0u8; 32];
        let produced = self.probes.jitter.read(&mut jitter_buf, 1)?;
        if produced == 0 {
            return Err(RngError::EntropySourceFailed);
        }
        pool.add_bytes(&jitter_buf[..produced]);
        jitter_buf.zeroize();

        let mut drive = 0usize;
        while let Some(snap) = self.probes.os_stats.disk_stats(drive) {
            pool.add_bytes(&snap);
            drive += 1;
        }
        if drive == 0 {
            self.skip_or_fail("disk statistics")?;
        }

        let kernel = self.probes.os_stats.kernel_stats();
        if kernel.is_empty() {
            self.skip_or_fail("kernel statistics")?;
        }
        for snap in kernel {
            pool.add_bytes(&snap);
        }

        let net = self.probes.os_stats.net_proto_stats();
        if net.is_empty() {
            self.skip_or_fail("tcp/ip statistics")?;
        }
        for snap in net {
            pool.add_bytes(&snap);
        }

        match self.probes.os_stats.net_service_stats() {
            Some(snap) => pool.add_bytes(&snap),
            None => self.skip_or_fail("network service statistics")?,
        }

        // Telemetry interfaces are optional equipment; absence is normal.
        for snap in self.probes.os_stats.hw_telemetry() {
            pool.add_bytes(&snap);
        }

        pool.mix();
        Ok(())
    }

    /// Drain the user-event source, if one is installed, mixing the CRC
    /// of each distinct event with the CRC of its inter-event delay.
    /// Finishes with a pool mix.
    pub fn capture_user_events(&mut self, pool: &mut Pool) -> Result<(), RngError> {
        let Some(source) = self.user_events.as_mut() else {
            return Ok(());
        };

        let mut captured = 0usize;
        let mut prev_payload: Option<Vec<u8>> = None;
        let mut prev_ms = 0u64;

        while captured < USER_EVENT_TARGET {
            let Some(event) = source.next_event() else {
                log::warn!("user-event source closed after {captured} events");
                return Err(RngError::EntropySourceFailed);
            };
            // Repeats of the previous event carry no fresh information.
            if prev_payload.as_deref() == Some(&event.payload[..]) {
                continue;
            }

            let delta = event.timestamp_ms.wrapping_sub(prev_ms) as u32;
            prev_ms = event.timestamp_ms;

            let word = crc32(&event.payload).wrapping_add(crc32(&delta.to_le_bytes()));
            pool.add_u32(word);

            prev_payload = Some(event.payload);
            captured += 1;
        }

        pool.mix();
        Ok(())
    }

    fn skip_or_fail(&self, what: &str) -> Result<(), RngError> {
        if self.strict_checks {
            log::warn!("slow poll: {what} unavailable (strict checks enabled)");
            Err(RngError::EntropySourceFailed)
        } else {
            log::debug!("slow poll: {what} unavailable, skipped");
            Ok(())
        }
    }
}

fn skip_or_add(pool: &mut Pool, what: &str, snapshot: Option<Vec<u8>>) {
    match snapshot {
        Some(bytes) => pool.add_bytes(&bytes),
        None => log::debug!("fast poll: {what} unavailable, skipped"),
    }
}
