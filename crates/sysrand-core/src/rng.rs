//! The process-wide generator.
//!
//! Every probe must feed the same pool, so the pool, its collector, and
//! the background fast-poll thread live in a single module-level slot.
//! Consumers block: fetches serialize on the pool lock, and the first
//! fetch additionally pays for a full slow poll.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use zeroize::Zeroizing;

use sysrand_types::RngError;

use crate::collector::{Collector, UserEventSource};
use crate::pool::Pool;
use crate::probes::Probes;

/// Interval between background fast polls.
pub const FAST_POLL_INTERVAL: Duration = Duration::from_millis(500);

struct Inner {
    pool: Pool,
    collector: Collector,
}

struct Shared {
    inner: Mutex<Inner>,
    stop: AtomicBool,
    did_slow_poll: AtomicBool,
}

struct Handle {
    shared: Arc<Shared>,
    fast_poll_thread: Option<JoinHandle<()>>,
}

static RNG: Mutex<Option<Handle>> = Mutex::new(None);

/// Start the generator with the platform-default probe set.
///
/// Idempotent: a second call while running returns `true` immediately.
/// Returns `false` if the pool cannot be allocated or the fast-poll
/// thread cannot be spawned.
pub fn start() -> bool {
    start_with_probes(Probes::platform_default())
}

/// Start the generator with a caller-supplied probe set.
pub fn start_with_probes(probes: Probes) -> bool {
    let mut slot = RNG.lock().unwrap();
    if slot.is_some() {
        return true;
    }

    let pool = match Pool::new() {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("rng start: pool allocation failed: {e}");
            return false;
        }
    };

    let shared = Arc::new(Shared {
        inner: Mutex::new(Inner {
            pool,
            collector: Collector::new(probes),
        }),
        stop: AtomicBool::new(false),
        did_slow_poll: AtomicBool::new(false),
    });

    let task_shared = Arc::clone(&shared);
    let spawned = std::thread::Builder::new()
        .name("sysrand-fast-poll".into())
        .spawn(move || fast_poll_loop(task_shared));

    match spawned {
        Ok(handle) => {
            *slot = Some(Handle {
                shared,
                fast_poll_thread: Some(handle),
            });
            true
        }
        Err(e) => {
            log::error!("rng start: fast-poll thread spawn failed: {e}");
            false
        }
    }
}

fn fast_poll_loop(shared: Arc<Shared>) {
    loop {
        {
            let mut inner = shared.inner.lock().unwrap();
            if shared.stop.load(Ordering::Acquire) {
                return;
            }
            let inner = &mut *inner;
            if let Err(e) = inner.collector.fast_poll(&mut inner.pool) {
                log::warn!("background fast poll failed: {e}");
            }
        }
        std::thread::sleep(FAST_POLL_INTERVAL);
    }
}

/// Stop the generator: signal the fast-poll task, join it, drop any
/// user-event source, and scrub the pool. Idempotent.
pub fn stop() {
    let handle = RNG.lock().unwrap().take();
    let Some(mut handle) = handle else {
        return;
    };

    handle.shared.stop.store(true, Ordering::Release);
    if let Some(thread) = handle.fast_poll_thread.take() {
        if thread.join().is_err() {
            log::warn!("fast-poll thread panicked before join");
        }
    }

    let mut inner = handle.shared.inner.lock().unwrap();
    inner.collector.clear_user_event_source();
    inner.pool.scrub();
    handle.shared.did_slow_poll.store(false, Ordering::Release);
}

/// Whether the generator is currently running.
pub fn did_start() -> bool {
    RNG.lock().unwrap().is_some()
}

/// Whether a slow poll has completed since the generator started.
pub fn did_slow_poll() -> bool {
    RNG.lock()
        .unwrap()
        .as_ref()
        .is_some_and(|h| h.shared.did_slow_poll.load(Ordering::Acquire))
}

/// Mix the pool.
pub fn mix() {
    if let Some(shared) = current_shared() {
        shared.inner.lock().unwrap().pool.mix();
    }
}

/// Escalate skipped OS-statistics probes to slow-poll failures.
pub fn set_strict_checks(on: bool) {
    if let Some(shared) = current_shared() {
        shared.inner.lock().unwrap().collector.set_strict_checks(on);
    }
}

/// Install a user-event source; subsequent fetches will block until 256
/// distinct events have been captured and mixed in.
pub fn enable_user_events(source: Box<dyn UserEventSource>) {
    if let Some(shared) = current_shared() {
        shared
            .inner
            .lock()
            .unwrap()
            .collector
            .set_user_event_source(source);
    }
}

/// Fetch random bytes, always forcing a fresh slow poll first.
///
/// Returns `false` on any failure; the buffer is untouched in that case.
pub fn fetch(buf: &mut [u8]) -> bool {
    match fetch_bytes(buf, true) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("rng fetch failed: {e}");
            false
        }
    }
}

/// Fetch random bytes from the pool.
///
/// A slow poll runs first if none has completed yet or `force_slow` is
/// set. The extraction itself is two XOR passes over the mixed pool
/// separated by a whole-pool bit inversion, staged in a scratch buffer so
/// a failure never modifies `buf`.
pub fn fetch_bytes(buf: &mut [u8], force_slow: bool) -> Result<(), RngError> {
    let shared = current_shared().ok_or(RngError::NotInitialized)?;
    let mut inner = shared.inner.lock().unwrap();
    let inner = &mut *inner;

    if buf.len() > inner.pool.size() {
        return Err(RngError::InvalidArgument);
    }

    if !shared.did_slow_poll.load(Ordering::Acquire) || force_slow {
        inner.collector.slow_poll(&mut inner.pool)?;
        shared.did_slow_poll.store(true, Ordering::Release);
    }

    inner.collector.capture_user_events(&mut inner.pool)?;

    // Staged in a self-scrubbing buffer: a poll failure between the two
    // passes must not leave extracted bytes behind.
    let mut scratch = Zeroizing::new(vec![0u8; buf.len()]);

    // First pass: poll, mix, extract.
    inner.collector.fast_poll(&mut inner.pool)?;
    inner.pool.extract_xor(&mut scratch);

    // Invert, then a second pass; no single pool snapshot reveals the
    // delivered bytes.
    inner.pool.invert();
    inner.collector.fast_poll(&mut inner.pool)?;
    inner.pool.extract_xor(&mut scratch);

    // Final mix decorrelates the surviving state from the output.
    inner.pool.mix();

    buf.copy_from_slice(&scratch);
    Ok(())
}

fn current_shared() -> Option<Arc<Shared>> {
    RNG.lock().unwrap().as_ref().map(|h| Arc::clone(&h.shared))
}
