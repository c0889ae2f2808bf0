//! Driver errors

use core::fmt;

/// Errors reported by every fallible driver operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Register transaction failed in the transport.
    /// Never retried by the driver.
    Io,

    /// Out of range address, mode, module or value.
    InvalidArgument,

    /// A closed loop search ran out of its iteration budget, or a register
    /// read back a value that matches no documented encoding.
    UnexpectedState,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io => f.write_str("register I/O failed"),
            Error::InvalidArgument => f.write_str("invalid argument"),
            Error::UnexpectedState => f.write_str("unexpected device state"),
        }
    }
}
