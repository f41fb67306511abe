//! Host emulation of the architecture facade for testing on a dev machine.
//!
//! OS threads stand in for the two cores: each thread adopts a core
//! identity via [`set_current_core`], and the core-private registers
//! (BASEPRI, SCR, the event latch) become per-core words in this module.
//! No actual masking or power management occurs; tests observe the
//! emulated register state instead.

use super::detection::{CoreId, CM4_PART_NUMBER, CM7_PART_NUMBER};
use super::Platform;
use core::cell::Cell;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

std::thread_local! {
    static CURRENT_CORE: Cell<CoreId> = const { Cell::new(CoreId::Cm7) };
    static IN_INTERRUPT: Cell<bool> = const { Cell::new(false) };
}

/// Emulated core-private register state.
struct CoreState {
    basepri: AtomicU32,
    event_pending: AtomicBool,
    faults_masked: AtomicBool,
    sleep_deep: AtomicBool,
    halted: AtomicBool,
    wfi_count: AtomicU32,
}

impl CoreState {
    const fn new() -> Self {
        Self {
            basepri: AtomicU32::new(0),
            event_pending: AtomicBool::new(false),
            faults_masked: AtomicBool::new(false),
            sleep_deep: AtomicBool::new(false),
            halted: AtomicBool::new(false),
            wfi_count: AtomicU32::new(0),
        }
    }
}

static CM7_STATE: CoreState = CoreState::new();
static CM4_STATE: CoreState = CoreState::new();
static RESET_REQUESTED: AtomicBool = AtomicBool::new(false);

fn state(core: CoreId) -> &'static CoreState {
    match core {
        CoreId::Cm7 => &CM7_STATE,
        CoreId::Cm4 => &CM4_STATE,
    }
}

/// Adopt a core identity for the calling OS thread.
///
/// Several threads may share one identity (a thread simulating an ISR on
/// that core alongside the thread simulating its main context).
pub fn set_current_core(core: CoreId) {
    CURRENT_CORE.with(|c| c.set(core));
}

/// Mark the calling thread as running in (or out of) interrupt context.
pub fn set_interrupt_context(active: bool) {
    IN_INTERRUPT.with(|c| c.set(active));
}

/// Consume a pending cross-core event for `core`, if any.
///
/// Interrupt-pump threads poll this and invoke the wake handler on a hit,
/// standing in for the SEV-wired interrupt line.
pub fn take_event(core: CoreId) -> bool {
    state(core).event_pending.swap(false, Ordering::AcqRel)
}

/// Emulated BASEPRI of `core`.
pub fn basepri_of(core: CoreId) -> u8 {
    state(core).basepri.load(Ordering::Acquire) as u8
}

/// Whether `core` has parked in its terminal halt loop.
pub fn is_halted(core: CoreId) -> bool {
    state(core).halted.load(Ordering::Acquire)
}

/// Whether `core` has set SLEEPDEEP.
pub fn is_sleep_deep(core: CoreId) -> bool {
    state(core).sleep_deep.load(Ordering::Acquire)
}

/// Whether `core` has masked faults.
pub fn faults_masked(core: CoreId) -> bool {
    state(core).faults_masked.load(Ordering::Acquire)
}

/// Whether any core requested a system reset.
pub fn reset_requested() -> bool {
    RESET_REQUESTED.load(Ordering::Acquire)
}

/// Number of WFI executions on `core`.
pub fn wfi_count(core: CoreId) -> u32 {
    state(core).wfi_count.load(Ordering::Acquire)
}

/// Restore the emulated registers to their power-on state.
///
/// Threads parked by a previous halt are not resurrected; tests must not
/// reuse them.
pub fn reset_state() {
    for core in [CoreId::Cm7, CoreId::Cm4] {
        let s = state(core);
        s.basepri.store(0, Ordering::Release);
        s.event_pending.store(false, Ordering::Release);
        s.faults_masked.store(false, Ordering::Release);
        s.sleep_deep.store(false, Ordering::Release);
        s.halted.store(false, Ordering::Release);
        s.wfi_count.store(0, Ordering::Release);
    }
    RESET_REQUESTED.store(false, Ordering::Release);
}

/// Host implementation of [`Platform`].
pub struct HostPlatform;

impl Platform for HostPlatform {
    fn isb() {}

    fn dsb() {
        portable_atomic::fence(Ordering::SeqCst);
    }

    fn wfi() {
        let core = CURRENT_CORE.with(|c| c.get());
        state(core).wfi_count.fetch_add(1, Ordering::AcqRel);
        std::thread::yield_now();
    }

    fn wfe() {
        std::thread::yield_now();
    }

    fn sev() {
        let core = CURRENT_CORE.with(|c| c.get());
        state(core.peer()).event_pending.store(true, Ordering::Release);
    }

    fn set_basepri(level: u8) {
        let core = CURRENT_CORE.with(|c| c.get());
        state(core).basepri.store(level as u32, Ordering::Release);
    }

    fn disable_faults() {
        let core = CURRENT_CORE.with(|c| c.get());
        state(core).faults_masked.store(true, Ordering::Release);
    }

    fn cpu_part_number() -> u32 {
        match CURRENT_CORE.with(|c| c.get()) {
            CoreId::Cm7 => CM7_PART_NUMBER,
            CoreId::Cm4 => CM4_PART_NUMBER,
        }
    }

    fn active_interrupt() -> u32 {
        // Any nonzero value reads as exception context
        if IN_INTERRUPT.with(|c| c.get()) {
            16
        } else {
            0
        }
    }

    fn sleep_deep() {
        let core = CURRENT_CORE.with(|c| c.get());
        state(core).sleep_deep.store(true, Ordering::Release);
    }

    fn request_system_reset() {
        RESET_REQUESTED.store(true, Ordering::Release);
    }

    fn halt() -> ! {
        let core = CURRENT_CORE.with(|c| c.get());
        state(core).halted.store(true, Ordering::Release);
        loop {
            std::thread::park();
        }
    }
}
