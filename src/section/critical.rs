//! Per-core reentrant critical sections.
//!
//! Entering raises the calling core's BASEPRI to the configured floor,
//! which blocks the scheduler and every maskable interrupt at or below
//! it. Sections nest; the mask is only touched on the outermost
//! enter/exit. Each core has its own depth counter, mutated exclusively
//! by code running on that core.

use crate::arch::detection::{current_core, CoreId};
use crate::arch::{DefaultPlatform as P, Platform};
use crate::config::IRQ_PRIORITY_FLOOR;
use crate::errors::{KernelError, KernelResult};
use portable_atomic::{AtomicI32, Ordering};

static CM7_DEPTH: AtomicI32 = AtomicI32::new(0);
static CM4_DEPTH: AtomicI32 = AtomicI32::new(0);

fn depth_of(core: CoreId) -> &'static AtomicI32 {
    match core {
        CoreId::Cm7 => &CM7_DEPTH,
        CoreId::Cm4 => &CM4_DEPTH,
    }
}

/// Enter a critical section on the calling core.
///
/// Nests freely as long as every entry is matched by an
/// [`exit_critical`]. On the outermost entry the interrupt mask is raised
/// to [`IRQ_PRIORITY_FLOOR`]; any interrupt raised below the floor waits
/// until the section is exited. Always succeeds.
pub fn enter_critical() {
    let depth = depth_of(current_core());
    if depth.load(Ordering::Acquire) == 0 {
        P::set_basepri(IRQ_PRIORITY_FLOOR);
        P::isb();
    }
    // An ISR preempting between the check and the increment leaves the
    // depth as it found it, so the transition count stays consistent.
    depth.fetch_add(1, Ordering::AcqRel);
}

/// Exit a critical section on the calling core.
///
/// On the outermost exit the interrupt mask is lowered again.
///
/// # Errors
///
/// [`KernelError::InvalidState`] if the core is not in a critical
/// section; the state is left unchanged.
pub fn exit_critical() -> KernelResult<()> {
    let depth = depth_of(current_core());
    if depth.load(Ordering::Acquire) == 0 {
        return Err(KernelError::InvalidState);
    }
    if depth.fetch_sub(1, Ordering::AcqRel) == 1 {
        P::set_basepri(0);
        P::isb();
    }
    Ok(())
}

/// Whether the calling core is inside a critical section.
pub fn is_critical() -> bool {
    depth_of(current_core()).load(Ordering::Acquire) > 0
}

/// Forcibly leave all critical sections on the calling core.
///
/// Zeroes the depth counter and lowers the interrupt mask. Intended only
/// for fault-recovery paths that must restore a sane interrupt state.
pub fn reset_critical() {
    depth_of(current_core()).store(0, Ordering::Release);
    P::set_basepri(0);
    P::isb();
}

#[cfg(test)]
pub(crate) fn depth_for_test(core: CoreId) -> i32 {
    depth_of(core).load(Ordering::SeqCst)
}

#[cfg(test)]
pub(crate) fn reset_for_test() {
    CM7_DEPTH.store(0, Ordering::SeqCst);
    CM4_DEPTH.store(0, Ordering::SeqCst);
}
