//! Critical and exclusive sections.
//!
//! A *critical* section is per-core: it masks scheduler-eligible
//! interrupts on the calling core only. An *exclusive* section is
//! process-wide: while one core holds it, the other core is guaranteed
//! not to be making progress.

pub mod critical;
pub mod exclusive;

pub use critical::{enter_critical, exit_critical, is_critical, reset_critical};
pub use exclusive::{enter_exclusive, exit_exclusive, is_exclusive, reset_exclusive};
