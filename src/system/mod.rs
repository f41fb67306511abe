//! System control: coordinated shutdown, reset and low-power sleep.
//!
//! Shutdown is a two-core rendezvous. Whichever core calls
//! [`sys_shutdown`] first raises its flag and wakes the peer; the peer's
//! wake handler raises its own flag and starts its local teardown. Each
//! core proceeds into its exit-handler sweep only after observing the
//! other's flag, so both cores are guaranteed to reach their terminal
//! low-power loop together.

mod exit;

use crate::arch::detection::{current_core, CoreId};
use crate::arch::{DefaultPlatform as P, Platform};
use crate::errors::KernelResult;
use crate::section::critical::{enter_critical, exit_critical, is_critical};
use crate::section::exclusive;
use portable_atomic::{AtomicU32, Ordering};

static CM7_SHUTDOWN: AtomicU32 = AtomicU32::new(0);
static CM4_SHUTDOWN: AtomicU32 = AtomicU32::new(0);

fn shutdown_flag(core: CoreId) -> &'static AtomicU32 {
    match core {
        CoreId::Cm7 => &CM7_SHUTDOWN,
        CoreId::Cm4 => &CM4_SHUTDOWN,
    }
}

/// Register a kernel exit handler for `core`, executed during shutdown in
/// registration order.
///
/// # Errors
///
/// [`crate::KernelError::Busy`] if that core's table is full.
pub fn register_exit_handler(core: CoreId, handler: fn()) -> KernelResult<()> {
    exit::kernel_table(core).register(handler)
}

/// Register an MCU exit handler, executed on the CM7 shutdown path after
/// the CM7 kernel handlers.
///
/// # Errors
///
/// [`crate::KernelError::Busy`] if the table is full.
pub fn register_mcu_exit_handler(handler: fn()) -> KernelResult<()> {
    exit::mcu_table().register(handler)
}

// Teardown for the calling core: sweep its tables, then park in the
// deepest sleep state until an external reset event.
fn run_shutdown(core: CoreId) -> ! {
    // Mask interrupts and faults first so nothing can abort the sweep.
    P::disable_faults();
    match core {
        CoreId::Cm7 => {
            exit::kernel_table(CoreId::Cm7).run_once();
            exit::mcu_table().run_once();
        }
        CoreId::Cm4 => exit::kernel_table(CoreId::Cm4).run_once(),
    }
    P::sleep_deep();
    P::dsb();
    P::isb();
    P::halt()
}

/// Shut down the system (both cores). Does not return.
///
/// Guarantees that both cores run their registered exit handlers and
/// enter their terminal low-power state; the system then stays down
/// until an external reset event.
pub fn sys_shutdown() -> ! {
    let core = current_core();
    shutdown_flag(core).store(1, Ordering::SeqCst);
    // Wake the peer; its handler starts the matching shutdown sequence.
    P::dsb();
    P::sev();
    // Hold here until the peer acknowledges by raising its own flag.
    while shutdown_flag(core.peer()).load(Ordering::SeqCst) != 1 {
        core::hint::spin_loop();
    }
    run_shutdown(core)
}

/// Cross-core wake interrupt handler body.
///
/// The board crate must call this from each core's inter-core event
/// interrupt. It closes the shutdown rendezvous when the peer is going
/// down, and otherwise services the exclusive-section acknowledgment
/// window.
pub fn sev_wake_handler() {
    enter_critical();
    let core = current_core();
    if shutdown_flag(core.peer()).load(Ordering::SeqCst) != 0 {
        shutdown_flag(core).store(1, Ordering::SeqCst);
        run_shutdown(core);
    }
    let _ = exit_critical();
    exclusive::ack_window();
}

/// Trigger an architectural system reset (both cores). Does not return.
pub fn sys_restart() -> ! {
    // Mask interrupts and faults so the reset request always lands.
    P::disable_faults();
    P::request_system_reset();
    P::dsb();
    P::isb();
    P::halt()
}

/// Put the calling core into a low-power state until the next interrupt.
///
/// Does nothing inside a critical section: sleeping with the scheduler's
/// interrupts masked would never wake.
pub fn sys_sleep() {
    if !is_critical() {
        P::dsb();
        P::isb();
        P::wfi();
    }
}

#[cfg(test)]
pub(crate) fn shutdown_flag_for_test(core: CoreId) -> u32 {
    shutdown_flag(core).load(Ordering::SeqCst)
}

#[cfg(test)]
pub(crate) fn reset_for_test() {
    CM7_SHUTDOWN.store(0, Ordering::SeqCst);
    CM4_SHUTDOWN.store(0, Ordering::SeqCst);
    exit::reset_for_test();
}
