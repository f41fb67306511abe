#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![forbid(unreachable_pub)]

//! Dual-core coordination kernel for the STM32H7 family (Cortex-M7 + Cortex-M4).
//!
//! This library is the execution-model core of a dual-core flight computer:
//! it owns the monotonic clock, per-core critical sections, the cross-core
//! exclusive section, and the coordinated two-core shutdown path. Peripheral
//! drivers, sensor math and the thread scheduler live in sibling crates and
//! only see the symbol-level API re-exported below.
//!
//! # Target Platform
//!
//! - **Hardware**: STM32H755-class dual-core MCUs
//! - **Cores**: ARM Cortex-M7 (CM7) and Cortex-M4 (CM4)
//! - **Environment**: Bare-metal (no operating system)
//!
//! # Features
//!
//! - `std-shim`: Enable compatibility layer for testing on host
//!
//! # Quick Start
//!
//! ```ignore
//! use crosscore::{enter_exclusive, exit_exclusive};
//!
//! fn flush_shared_telemetry() -> crosscore::KernelResult<()> {
//!     enter_exclusive()?;
//!     // ... touch state shared between CM7 and CM4 ...
//!     exit_exclusive()?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The library is organized around a few key pieces:
//! - A seq-lock protected 64-bit microsecond clock fed by the kernel tick
//! - Per-core reentrant interrupt masking (BASEPRI floor)
//! - A cross-core mutex with a mutual-acknowledgment handshake between cores
//! - A two-core shutdown rendezvous that sweeps registered exit handlers
//!
//! Interrupt wiring is the board crate's job: the kernel tick handler must
//! call [`update_time`], and each core's cross-core event interrupt must
//! call [`sev_wake_handler`].

// Core modules
pub mod arch;
pub mod config;
pub mod errors;
pub mod section;
pub mod system;
pub mod time;

#[cfg(any(test, feature = "std-shim"))]
extern crate std;

#[cfg(test)]
mod tests;

// Panic handler for bare-metal
#[cfg(all(not(test), not(feature = "std-shim")))]
use core::panic::PanicInfo;

#[cfg(all(not(test), not(feature = "std-shim")))]
#[panic_handler]
fn panic(_info: &PanicInfo) -> ! {
    // On panic, mask faults and halt the calling core
    #[cfg(target_arch = "arm")]
    unsafe {
        core::arch::asm!("cpsid f", options(nomem, nostack));
    }
    loop {
        #[cfg(target_arch = "arm")]
        unsafe {
            core::arch::asm!("wfe", options(nomem, nostack));
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

// Architecture facade
pub use arch::{DefaultPlatform, Platform};

// Core identity and execution context
pub use arch::detection::{current_core, is_interrupt, CoreId};

// Time service
pub use time::{get_time, sleep, sleep_until, update_time};
pub use time::{
    days_to_time, hours_to_time, micros_to_time, millis_to_time, minutes_to_time,
    seconds_to_time, time_to_days, time_to_hours, time_to_micros, time_to_millis,
    time_to_minutes, time_to_seconds,
};

// Sections
pub use section::{
    enter_critical, enter_exclusive, exit_critical, exit_exclusive, is_critical, is_exclusive,
};

// System control
pub use system::{
    register_exit_handler, register_mcu_exit_handler, sev_wake_handler, sys_restart,
    sys_shutdown, sys_sleep,
};

// Errors
pub use errors::{KernelError, KernelResult};

// ============================================================================
// Scheduler integration
// ============================================================================

use portable_atomic::{AtomicUsize, Ordering};

static YIELD_HOOK: AtomicUsize = AtomicUsize::new(0);

/// Install the scheduler's yield function.
///
/// The blocking time operations ([`sleep`], [`sleep_until`]) call the hook
/// between clock polls so other threads on the calling core can run. Before
/// a hook is installed they fall back to a spin-loop hint.
pub fn set_yield_hook(hook: fn()) {
    YIELD_HOOK.store(hook as usize, Ordering::Release);
}

/// Yield the calling thread's time slice to the scheduler.
#[inline]
pub fn yield_now() {
    let raw = YIELD_HOOK.load(Ordering::Acquire);
    if raw == 0 {
        core::hint::spin_loop();
    } else {
        // Safety: the only non-zero values ever stored come from
        // `set_yield_hook`, which takes a `fn()`.
        let hook: fn() = unsafe { core::mem::transmute(raw) };
        hook();
    }
}
