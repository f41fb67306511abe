//! Error handling for the coordination kernel.
//!
//! Every fallible kernel operation returns [`KernelResult`]. Errors are
//! surfaced immediately to the caller and never stored; telemetry is the
//! collaborator layer's job.

use core::fmt;

/// Result type for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;

/// Error kinds raised by the coordination kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// An input violates a documented precondition. Caller bug.
    InvalidArg,
    /// An operation was invoked out of order (e.g. exit without enter).
    InvalidState,
    /// A bounded wait elapsed without progress. Caller may retry.
    Timeout,
    /// Arithmetic overflow during a unit conversion.
    Overflow,
    /// A sub-operation (typically a clock read) failed. Treat as fatal.
    Internal,
    /// A resource is at capacity or temporarily unavailable.
    Busy,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::InvalidArg => write!(f, "Argument violates a precondition"),
            KernelError::InvalidState => write!(f, "Operation invoked out of order"),
            KernelError::Timeout => write!(f, "Bounded wait elapsed without progress"),
            KernelError::Overflow => write!(f, "Arithmetic overflow"),
            KernelError::Internal => write!(f, "Internal sub-operation failed"),
            KernelError::Busy => write!(f, "Resource is at capacity"),
        }
    }
}
