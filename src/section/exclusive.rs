//! The cross-core exclusive section.
//!
//! A mutual-exclusion primitive between CM7 and CM4 built from a single
//! CAS-able lock word plus an acknowledgment handshake. The owner is
//! encoded directly in the lock word: `+1` for CM7, `-1` for CM4, `0`
//! for free, so one 32-bit CAS both acquires the lock and records the
//! owner.
//!
//! The handshake exists because both cores take the lock from inside a
//! local critical section. Without it, two cores spinning on each other
//! with interrupts masked would deadlock: each would wait forever for the
//! other to observe its request. Instead, a core that loses the CAS to
//! its peer asserts its own ack flag, telling the peer "I have seen your
//! lock and I am yielding progress". The winning core does not proceed
//! into the section body until it has that positive confirmation, and the
//! loser keeps re-asserting the flag from its wake-interrupt handler
//! ([`ack_window`]) for as long as the peer holds the lock.
//!
//! Every wait in this module is bounded by the clock, so a wedged peer
//! surfaces as [`KernelError::Timeout`] instead of a hang.

use crate::arch::detection::{current_core, CoreId};
use crate::arch::{DefaultPlatform as P, Platform};
use crate::config::{EXCLUSIVE_SECTION_ACK_TIMEOUT, EXCLUSIVE_SECTION_TIMEOUT};
use crate::errors::{KernelError, KernelResult};
use crate::section::critical::{enter_critical, exit_critical};
use crate::time::get_time;
use portable_atomic::{AtomicI32, AtomicU32, Ordering};

// Lock word: +1 = CM7 holds, -1 = CM4 holds, 0 = free.
static LOCK_TAG: AtomicI32 = AtomicI32::new(0);

// Reentrancy depth; meaningful only while LOCK_TAG != 0.
static EX_DEPTH: AtomicI32 = AtomicI32::new(0);

// Per-core acknowledgment flags, asserted by the non-holding core.
static CM7_ACK: AtomicU32 = AtomicU32::new(0);
static CM4_ACK: AtomicU32 = AtomicU32::new(0);

fn ack_of(core: CoreId) -> &'static AtomicU32 {
    match core {
        CoreId::Cm7 => &CM7_ACK,
        CoreId::Cm4 => &CM4_ACK,
    }
}

// Undo one entry; frees the lock when the outermost entry unwinds.
fn unwind_entry() {
    if EX_DEPTH.fetch_sub(1, Ordering::SeqCst) == 1 {
        LOCK_TAG.store(0, Ordering::SeqCst);
    }
}

/// Enter the exclusive section.
///
/// On success the calling core holds the section: no thread or maskable
/// interrupt makes progress on the peer core until the matching
/// [`exit_exclusive`]. Acquisitions nest.
///
/// Exclusive sections are expensive to enter (a full cross-core
/// handshake) and stall the whole MCU; use them sparingly.
///
/// # Errors
///
/// - [`KernelError::Timeout`] if the lock stayed with the peer past
///   [`EXCLUSIVE_SECTION_TIMEOUT`], or the peer's acknowledgment did not
///   arrive within [`EXCLUSIVE_SECTION_ACK_TIMEOUT`]. State is unwound.
/// - [`KernelError::Internal`] if a clock read failed; the section state
///   is undefined and the caller should escalate.
pub fn enter_exclusive() -> KernelResult<()> {
    // The lock must be taken with local interrupts masked: an ISR on this
    // core re-entering the protocol mid-acquisition would self-deadlock.
    enter_critical();
    let core = current_core();
    let this_tag = core.tag();
    let peer_tag = core.peer().tag();
    let this_ack = ack_of(core);

    if LOCK_TAG.load(Ordering::SeqCst) == this_tag {
        // Reentrant acquisition by the holder.
        EX_DEPTH.fetch_add(1, Ordering::SeqCst);
    } else {
        let start = match get_time() {
            Ok(t) => t,
            Err(_) => {
                let _ = exit_critical();
                return Err(KernelError::Internal);
            }
        };
        loop {
            match LOCK_TAG.compare_exchange(0, this_tag, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => break,
                Err(observed) => {
                    let now = match get_time() {
                        Ok(t) => t,
                        Err(_) => {
                            let _ = exit_critical();
                            return Err(KernelError::Internal);
                        }
                    };
                    if now - start > EXCLUSIVE_SECTION_TIMEOUT {
                        exit_critical().map_err(|_| KernelError::Internal)?;
                        return Err(KernelError::Timeout);
                    }
                    if observed == peer_tag {
                        // The peer holds the lock and may itself be
                        // spinning, interrupts masked, for our
                        // acknowledgment. Assert it here or neither core
                        // ever moves.
                        this_ack.store(1, Ordering::SeqCst);
                    }
                }
            }
        }
        this_ack.store(0, Ordering::SeqCst);
        EX_DEPTH.store(1, Ordering::SeqCst);
    }

    // Kick the peer's wake interrupt so its acknowledgment window opens.
    P::dsb();
    P::sev();

    // Positive confirmation that the peer has observed the held lock and
    // is not racing into a conflicting section.
    let start = match get_time() {
        Ok(t) => t,
        Err(_) => {
            unwind_entry();
            let _ = exit_critical();
            return Err(KernelError::Internal);
        }
    };
    let peer_ack = ack_of(core.peer());
    while peer_ack.load(Ordering::SeqCst) != 1 {
        let now = match get_time() {
            Ok(t) => t,
            Err(_) => {
                unwind_entry();
                let _ = exit_critical();
                return Err(KernelError::Internal);
            }
        };
        if now - start > EXCLUSIVE_SECTION_ACK_TIMEOUT {
            unwind_entry();
            exit_critical().map_err(|_| KernelError::Internal)?;
            return Err(KernelError::Timeout);
        }
    }

    exit_critical().map_err(|_| KernelError::Internal)
}

/// Exit the exclusive section.
///
/// The outermost exit frees the lock for the peer core.
///
/// # Errors
///
/// - [`KernelError::InvalidState`] if the calling core does not hold the
///   section. State unchanged.
/// - [`KernelError::Timeout`] if the peer's acknowledgment flag was no
///   longer asserted at exit time. The peer is supposed to hold it for
///   the whole section, so a cleared flag means the handshake broke down.
/// - [`KernelError::Internal`] if the critical-section unwind failed.
pub fn exit_exclusive() -> KernelResult<()> {
    enter_critical();
    let core = current_core();

    if LOCK_TAG.load(Ordering::SeqCst) != core.tag() {
        exit_critical().map_err(|_| KernelError::Internal)?;
        return Err(KernelError::InvalidState);
    }
    if ack_of(core.peer()).load(Ordering::SeqCst) == 0 {
        exit_critical().map_err(|_| KernelError::Internal)?;
        return Err(KernelError::Timeout);
    }

    if EX_DEPTH.fetch_sub(1, Ordering::SeqCst) == 1 {
        LOCK_TAG.store(0, Ordering::SeqCst);
    }
    exit_critical().map_err(|_| KernelError::Internal)
}

/// Whether the calling core currently holds the exclusive section.
pub fn is_exclusive() -> bool {
    LOCK_TAG.load(Ordering::SeqCst) == current_core().tag()
}

/// Acknowledgment window, run from the cross-core wake interrupt.
///
/// While the peer holds the lock, keep this core's ack flag asserted so
/// the peer's entry handshake and exit check both see a live
/// acknowledgment. The window is bounded by the clock; it closes early
/// if the lock is released. The tick interrupt sits above the critical
/// section's priority floor, so the clock stays readable here.
pub fn ack_window() {
    enter_critical();
    let core = current_core();
    let peer_tag = core.peer().tag();
    let this_ack = ack_of(core);

    if let Ok(start) = get_time() {
        while LOCK_TAG.load(Ordering::SeqCst) == peer_tag {
            match get_time() {
                Ok(now) if now - start < EXCLUSIVE_SECTION_TIMEOUT => {
                    this_ack.store(1, Ordering::SeqCst);
                }
                _ => break,
            }
        }
    }
    this_ack.store(0, Ordering::SeqCst);
    let _ = exit_critical();
}

/// Forcibly release the exclusive section if the calling core owns it.
///
/// Intended only for fault-recovery paths.
pub fn reset_exclusive() {
    enter_critical();
    if LOCK_TAG.load(Ordering::SeqCst) == current_core().tag() {
        EX_DEPTH.store(0, Ordering::SeqCst);
        LOCK_TAG.store(0, Ordering::SeqCst);
    }
    let _ = exit_critical();
}

#[cfg(test)]
pub(crate) fn ack_for_test(core: CoreId) -> u32 {
    ack_of(core).load(Ordering::SeqCst)
}

#[cfg(test)]
pub(crate) fn lock_tag_for_test() -> i32 {
    LOCK_TAG.load(Ordering::SeqCst)
}

#[cfg(test)]
pub(crate) fn depth_for_test() -> i32 {
    EX_DEPTH.load(Ordering::SeqCst)
}

#[cfg(test)]
pub(crate) fn reset_for_test() {
    LOCK_TAG.store(0, Ordering::SeqCst);
    EX_DEPTH.store(0, Ordering::SeqCst);
    CM7_ACK.store(0, Ordering::SeqCst);
    CM4_ACK.store(0, Ordering::SeqCst);
}
