//! The seq-lock protected microsecond clock.
//!
//! The tick handler must never be blocked by critical sections (time has
//! to advance even while a core sits in an exclusive section), so readers
//! cannot take a mutex. Instead the classic sequence-lock discipline is
//! used: the writer bumps a counter to odd, writes the value, bumps it
//! back to even; a reader retries until it sees the same even counter on
//! both sides of its loads.
//!
//! Neither Cortex-M core has 64-bit atomics, so the clock is kept as two
//! explicit 32-bit halves, each accessed with an atomic word operation.
//! The seq-lock is what makes the pair consistent.

use crate::config::{KERNEL_TICK_FREQ, TIME_LOCK_ATTEMPTS};
use crate::errors::{KernelError, KernelResult};
use portable_atomic::{AtomicU32, Ordering};

/// Microseconds added to the clock by each kernel tick.
pub const TICK_INCREMENT_US: i64 = super::convert::MICROS_PER_SECOND / KERNEL_TICK_FREQ as i64;

// Sequence counter; odd exactly while the halves are being written.
// Starts even: no write in progress at reset.
static SEQ: AtomicU32 = AtomicU32::new(0);

// Current time in microseconds, split into 32-bit halves.
static NOW_LO: AtomicU32 = AtomicU32::new(0);
static NOW_HI: AtomicU32 = AtomicU32::new(0);

#[inline]
fn assemble(lo: u32, hi: u32) -> i64 {
    ((hi as i64) << 32) | lo as i64
}

/// Advance the clock by one tick.
///
/// Must be called only from the kernel tick handler; exactly one context
/// in the whole system writes the clock. Wait-free.
pub fn update_time() {
    SEQ.fetch_add(1, Ordering::SeqCst);
    let next = assemble(NOW_LO.load(Ordering::SeqCst), NOW_HI.load(Ordering::SeqCst))
        + TICK_INCREMENT_US;
    NOW_LO.store(next as u32, Ordering::SeqCst);
    NOW_HI.store((next >> 32) as u32, Ordering::SeqCst);
    SEQ.fetch_add(1, Ordering::SeqCst);
}

/// Read the current time in microseconds.
///
/// Lock-free: retries while a tick is concurrently committing, bounded by
/// [`TIME_LOCK_ATTEMPTS`]. A consistent read always returns a value whose
/// two halves belong to the same committed tick.
///
/// # Errors
///
/// [`KernelError::Timeout`] if no consistent snapshot was obtained within
/// the attempt bound.
pub fn get_time() -> KernelResult<i64> {
    for _ in 0..=TIME_LOCK_ATTEMPTS {
        // If the halves are modified during the read, seq changes and the
        // snapshot is discarded.
        let seq_start = SEQ.load(Ordering::SeqCst);
        let lo = NOW_LO.load(Ordering::SeqCst);
        let hi = NOW_HI.load(Ordering::SeqCst);
        let seq_end = SEQ.load(Ordering::SeqCst);
        if seq_start == seq_end && seq_start & 1 == 0 {
            return Ok(assemble(lo, hi));
        }
    }
    Err(KernelError::Timeout)
}

/// Block the calling thread for at least `duration` microseconds of
/// monotonic time, yielding to the scheduler between clock polls.
///
/// There is no early return; the full duration always elapses.
///
/// # Errors
///
/// - [`KernelError::InvalidArg`] if `duration` is negative.
/// - [`KernelError::Internal`] if the underlying clock read fails.
pub fn sleep(duration: i64) -> KernelResult<()> {
    if duration < 0 {
        return Err(KernelError::InvalidArg);
    }
    let start = get_time().map_err(|_| KernelError::Internal)?;
    while get_time().map_err(|_| KernelError::Internal)? - start < duration {
        crate::yield_now();
    }
    Ok(())
}

/// Block the calling thread until the clock reaches or passes `time`
/// (microseconds), yielding to the scheduler between clock polls.
///
/// # Errors
///
/// - [`KernelError::InvalidArg`] if `time` has already passed at entry.
/// - [`KernelError::Internal`] if the underlying clock read fails.
pub fn sleep_until(time: i64) -> KernelResult<()> {
    let current = get_time().map_err(|_| KernelError::Internal)?;
    if time < current {
        return Err(KernelError::InvalidArg);
    }
    while get_time().map_err(|_| KernelError::Internal)? < time {
        crate::yield_now();
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn reset_for_test() {
    NOW_LO.store(0, Ordering::SeqCst);
    NOW_HI.store(0, Ordering::SeqCst);
    SEQ.store(0, Ordering::SeqCst);
}

/// Leaves the sequence counter odd, as if a writer died mid-commit.
#[cfg(test)]
pub(crate) fn poison_seq_for_test() {
    SEQ.fetch_add(1, Ordering::SeqCst);
}
