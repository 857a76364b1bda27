//! Entropy probe contracts and their default platform implementations.
//!
//! The collector consumes four kinds of probes:
//!
//! - [`SystemRng`] — the OS cryptographic RNG (the only probe whose
//!   failure is fatal to a fast poll);
//! - [`CpuRng`] — on-chip RDRAND/RDSEED-style generators, detected at
//!   startup;
//! - [`TimingJitter`] — an SP 800-90B-style timing-jitter collector,
//!   required to succeed for a slow poll;
//! - [`OsStats`] — per-OS structured snapshots treated as opaque byte
//!   buffers; semantic layout is never interpreted.

pub mod cpu;
pub mod jitter;
pub mod os_stats;
pub mod system;

pub use cpu::NativeCpuRng;
pub use jitter::JitterRng;
pub use os_stats::OsStats;
pub use system::OsSystemRng;

use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use sysrand_types::RngError;

/// OS cryptographic RNG.
pub trait SystemRng: Send {
    /// Fill `buf` with OS-provided random bytes.
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), RngError>;
}

/// CPU hardware RNG instructions. Absence of an instruction is reported
/// through `None`, never through an error.
pub trait CpuRng: Send {
    /// One 64-bit draw from the DRBG-backed instruction (RDRAND analog).
    fn rand64(&mut self) -> Option<u64>;

    /// One 64-bit draw from the conditioned-seed instruction (RDSEED
    /// analog).
    fn seed64(&mut self) -> Option<u64>;

    /// Whether the rand instruction was detected at construction.
    fn has_rand(&self) -> bool;

    /// Whether the seed instruction was detected at construction.
    fn has_seed(&self) -> bool;
}

/// Timing-jitter entropy collector.
pub trait TimingJitter: Send {
    /// Fill `buf` from timing jitter with the given oversampling rate.
    /// Returns the number of bytes produced.
    fn read(&mut self, buf: &mut [u8], osr: u32) -> Result<usize, RngError>;
}

/// The probe bundle handed to the collector.
pub struct Probes {
    pub system_rng: Box<dyn SystemRng>,
    pub cpu_rng: Box<dyn CpuRng>,
    pub jitter: Box<dyn TimingJitter>,
    pub os_stats: Box<dyn OsStats>,
}

impl Probes {
    /// The default probe set for this platform.
    pub fn platform_default() -> Self {
        Probes {
            system_rng: Box::new(OsSystemRng),
            cpu_rng: Box::new(NativeCpuRng::detect()),
            jitter: Box::new(JitterRng::new()),
            os_stats: os_stats::platform_default(),
        }
    }
}

/// Wall-clock time in nanoseconds since the epoch, truncated to 64 bits.
pub fn wall_clock_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Monotonic performance-counter reading in nanoseconds since the first
/// call in this process.
pub fn perf_counter_nanos() -> u64 {
    static BASE: OnceLock<Instant> = OnceLock::new();
    BASE.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

/// Raw timestamp-counter read where the architecture provides one.
pub fn read_tsc() -> Option<u64> {
    #[cfg(target_arch = "x86_64")]
    {
        Some(unsafe { core::arch::x86_64::_rdtsc() })
    }
    #[cfg(target_arch = "x86")]
    {
        Some(unsafe { core::arch::x86::_rdtsc() })
    }
    #[cfg(target_arch = "aarch64")]
    {
        let cnt: u64;
        unsafe {
            core::arch::asm!("mrs {}, cntvct_el0", out(reg) cnt);
        }
        Some(cnt)
    }
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
    {
        None
    }
}
