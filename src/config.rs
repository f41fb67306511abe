//! Compile-time configuration for the coordination kernel.
//!
//! These constants are the only tuning surface of the crate. Boards that
//! need different values fork this module; nothing here is read from
//! hardware.

/// Kernel tick frequency in Hz.
///
/// The board's tick interrupt (SysTick on CM7 in the reference wiring) must
/// fire at this rate and call [`crate::update_time`] from its handler.
pub const KERNEL_TICK_FREQ: u32 = 1_000;

/// Maximum number of seq-lock read attempts before a clock read reports
/// a timeout.
pub const TIME_LOCK_ATTEMPTS: u32 = 16;

/// Upper bound, in microseconds, on waiting for the cross-core exclusive
/// lock to become free.
pub const EXCLUSIVE_SECTION_TIMEOUT: i64 = 100_000;

/// Upper bound, in microseconds, on waiting for the peer core to
/// acknowledge an acquired exclusive section.
pub const EXCLUSIVE_SECTION_ACK_TIMEOUT: i64 = 10_000;

/// BASEPRI value installed while a critical section is open.
///
/// Interrupts with priority values numerically greater than or equal to
/// this floor (including the scheduler's PendSV) are masked. The kernel
/// tick must be configured *above* the floor (numerically lower) so the
/// clock keeps advancing inside critical sections.
pub const IRQ_PRIORITY_FLOOR: u8 = 0x10;

/// Capacity of each exit-handler table.
pub const EXIT_TABLE_CAPACITY: usize = 16;
