//! Conversions between microsecond time values and larger units.
//!
//! Kernel time is always an `i64` microsecond count. Converting to a
//! larger unit divides (round toward zero); converting from a larger unit
//! multiplies with overflow detection. Negative inputs are rejected in
//! both directions.

use crate::errors::{KernelError, KernelResult};

pub(crate) const MICROS_PER_MILLI: i64 = 1_000;
pub(crate) const MICROS_PER_SECOND: i64 = 1_000_000;
pub(crate) const MICROS_PER_MINUTE: i64 = 60_000_000;
pub(crate) const MICROS_PER_HOUR: i64 = 3_600_000_000;
pub(crate) const MICROS_PER_DAY: i64 = 86_400_000_000;

// A zero input never reaches the multiply.
fn from_unit(value: i64, factor: i64) -> KernelResult<i64> {
    if value < 0 {
        return Err(KernelError::InvalidArg);
    }
    if value == 0 {
        return Ok(0);
    }
    value.checked_mul(factor).ok_or(KernelError::Overflow)
}

fn to_unit(time: i64, factor: i64) -> KernelResult<i64> {
    if time < 0 {
        return Err(KernelError::InvalidArg);
    }
    if time == 0 {
        return Ok(0);
    }
    Ok(time / factor)
}

/// Microseconds to kernel time. Identity, with the negative-input check.
pub fn micros_to_time(micros: i64) -> KernelResult<i64> {
    if micros < 0 {
        return Err(KernelError::InvalidArg);
    }
    Ok(micros)
}

/// Kernel time to microseconds. Identity, with the negative-input check.
pub fn time_to_micros(time: i64) -> KernelResult<i64> {
    if time < 0 {
        return Err(KernelError::InvalidArg);
    }
    Ok(time)
}

/// Milliseconds to kernel time.
pub fn millis_to_time(millis: i64) -> KernelResult<i64> {
    from_unit(millis, MICROS_PER_MILLI)
}

/// Kernel time to whole milliseconds.
pub fn time_to_millis(time: i64) -> KernelResult<i64> {
    to_unit(time, MICROS_PER_MILLI)
}

/// Seconds to kernel time.
pub fn seconds_to_time(seconds: i64) -> KernelResult<i64> {
    from_unit(seconds, MICROS_PER_SECOND)
}

/// Kernel time to whole seconds.
pub fn time_to_seconds(time: i64) -> KernelResult<i64> {
    to_unit(time, MICROS_PER_SECOND)
}

/// Minutes to kernel time.
pub fn minutes_to_time(minutes: i64) -> KernelResult<i64> {
    from_unit(minutes, MICROS_PER_MINUTE)
}

/// Kernel time to whole minutes.
pub fn time_to_minutes(time: i64) -> KernelResult<i64> {
    to_unit(time, MICROS_PER_MINUTE)
}

/// Hours to kernel time.
pub fn hours_to_time(hours: i64) -> KernelResult<i64> {
    from_unit(hours, MICROS_PER_HOUR)
}

/// Kernel time to whole hours.
pub fn time_to_hours(time: i64) -> KernelResult<i64> {
    to_unit(time, MICROS_PER_HOUR)
}

/// Days to kernel time.
pub fn days_to_time(days: i64) -> KernelResult<i64> {
    from_unit(days, MICROS_PER_DAY)
}

/// Kernel time to whole days.
pub fn time_to_days(time: i64) -> KernelResult<i64> {
    to_unit(time, MICROS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_conversions() {
        assert_eq!(micros_to_time(0), Ok(0));
        assert_eq!(micros_to_time(1234), Ok(1234));
        assert_eq!(time_to_micros(i64::MAX), Ok(i64::MAX));
        assert_eq!(micros_to_time(-1), Err(KernelError::InvalidArg));
        assert_eq!(time_to_micros(-7), Err(KernelError::InvalidArg));
    }

    #[test]
    fn to_larger_unit_rounds_toward_zero() {
        assert_eq!(time_to_millis(999), Ok(0));
        assert_eq!(time_to_millis(1_000), Ok(1));
        assert_eq!(time_to_millis(1_999), Ok(1));
        assert_eq!(time_to_seconds(59_999_999), Ok(59));
        assert_eq!(time_to_minutes(MICROS_PER_MINUTE * 3 + 1), Ok(3));
        assert_eq!(time_to_hours(MICROS_PER_HOUR - 1), Ok(0));
        assert_eq!(time_to_days(MICROS_PER_DAY * 2), Ok(2));
    }

    #[test]
    fn zero_short_circuits_both_directions() {
        assert_eq!(millis_to_time(0), Ok(0));
        assert_eq!(days_to_time(0), Ok(0));
        assert_eq!(time_to_days(0), Ok(0));
    }

    #[test]
    fn from_larger_unit_detects_overflow() {
        assert_eq!(millis_to_time(i64::MAX), Err(KernelError::Overflow));
        assert_eq!(seconds_to_time(i64::MAX / 2), Err(KernelError::Overflow));
        // ~10^16 us fits, 10^8 days does not
        assert_eq!(days_to_time(107_000), Ok(107_000 * MICROS_PER_DAY));
        assert_eq!(days_to_time(100_000_000), Err(KernelError::Overflow));
    }

    #[test]
    fn negative_inputs_rejected() {
        assert_eq!(millis_to_time(-1), Err(KernelError::InvalidArg));
        assert_eq!(time_to_millis(-1), Err(KernelError::InvalidArg));
        assert_eq!(hours_to_time(i64::MIN), Err(KernelError::InvalidArg));
    }
}
