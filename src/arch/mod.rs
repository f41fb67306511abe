//! Architecture abstraction layer for the dual-core coordination kernel.
//!
//! This module provides a unified interface for the handful of
//! architecture-specific operations the kernel needs: synchronization
//! barriers, low-power waits, the cross-core event signal, interrupt
//! masking and the identity/status registers.

/// Architecture facade trait.
///
/// Implemented once for the real Cortex-M target and once for the host
/// emulation used by tests. All functions are associated (stateless); the
/// hardware implementation reads and writes core-private registers, so
/// every operation implicitly applies to the calling core.
///
/// # Contract
///
/// - [`set_basepri`](Platform::set_basepri) masks all interrupts whose
///   priority value is numerically `>=` the given level; the kernel tick
///   interrupt must be configured above the
///   [`IRQ_PRIORITY_FLOOR`](crate::config::IRQ_PRIORITY_FLOOR) so the
///   clock keeps advancing while critical sections are open.
/// - [`sev`](Platform::sev) must raise the cross-core wake interrupt on
///   the peer core, whose handler calls
///   [`sev_wake_handler`](crate::system::sev_wake_handler).
pub trait Platform {
    /// Instruction synchronization barrier.
    fn isb();

    /// Data synchronization barrier.
    fn dsb();

    /// Wait for interrupt.
    fn wfi();

    /// Wait for event.
    fn wfe();

    /// Send an event to the peer core.
    fn sev();

    /// Write the BASEPRI interrupt mask of the calling core. Zero unmasks.
    fn set_basepri(level: u8);

    /// Mask all interrupts *and* configurable faults on the calling core.
    ///
    /// Used on teardown paths so a concurrent fault cannot abort them.
    /// There is deliberately no inverse; only reset undoes it.
    fn disable_faults();

    /// CPUID PARTNO field of the calling core.
    fn cpu_part_number() -> u32;

    /// Active exception number (IPSR). Zero in thread mode.
    fn active_interrupt() -> u32;

    /// Set SLEEPDEEP so the next wait enters the deepest power state.
    fn sleep_deep();

    /// Request an architectural system reset (both cores).
    fn request_system_reset();

    /// Park the calling core forever.
    fn halt() -> !;
}

pub mod detection;

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod cortex_m;
#[cfg(any(test, feature = "std-shim"))]
pub mod host;

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub use cortex_m::CortexM as DefaultPlatform;

// For testing/std-shim on hosted targets
#[cfg(all(not(all(target_arch = "arm", target_os = "none")), any(test, feature = "std-shim")))]
pub use host::HostPlatform as DefaultPlatform;

// Compile error for unsupported configurations
#[cfg(all(
    not(all(target_arch = "arm", target_os = "none")),
    not(any(test, feature = "std-shim"))
))]
compile_error!("This library targets bare-metal dual-core Cortex-M (thumbv7em-none-eabi*). Enable the std-shim feature for testing on a hosted target.");
