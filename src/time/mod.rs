//! Monotonic time service.
//!
//! A 64-bit microsecond clock advanced by the kernel tick interrupt and
//! readable from any context on either core, including the tick handler
//! itself, without taking a lock. Blocking sleeps and unit conversions
//! sit on top of the clock.

pub mod clock;
pub mod convert;

pub use clock::{get_time, sleep, sleep_until, update_time, TICK_INCREMENT_US};
pub use convert::{
    days_to_time, hours_to_time, micros_to_time, millis_to_time, minutes_to_time,
    seconds_to_time, time_to_days, time_to_hours, time_to_micros, time_to_millis,
    time_to_minutes, time_to_seconds,
};
