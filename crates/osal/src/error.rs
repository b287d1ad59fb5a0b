//! Error type shared by the fallible operations in this crate.

use core::fmt;

/// Errors reported by OSAL operations.
///
/// Every error is reported by value; nothing in this crate unwinds across
/// an API boundary except the [`fault`](crate::fault) policy, which is
/// terminal by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The active backend does not provide this capability.
    NotSupported,
    /// A bounded wait expired before the resource became available.
    Timeout,
    /// A bounded container or registry has no free slot.
    Full,
    /// The requested entry does not exist.
    NotFound,
    /// The operation is not valid in the object's current state.
    InvalidState,
    /// The underlying task failed to spawn or terminated abnormally.
    TaskFailed,
    /// A collaborating driver signalled an unrecoverable error event.
    SystemError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSupported => write!(f, "operation not supported by the active backend"),
            Self::Timeout => write!(f, "operation timed out"),
            Self::Full => write!(f, "no free slot available"),
            Self::NotFound => write!(f, "entry not found"),
            Self::InvalidState => write!(f, "operation invalid in the current state"),
            Self::TaskFailed => write!(f, "task failed"),
            Self::SystemError => write!(f, "system error event signalled"),
        }
    }
}

#[cfg(feature = "host")]
impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
