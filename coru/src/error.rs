//! Status and error codes
//!
//! The numeric values are the negated POSIX errno values, so they can travel
//! next to ordinary positive results and next to POSIX error codes.

use core::fmt;

/// Outcome of a successful [`resume`](crate::Coroutine::resume)
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Status {
    /// The callback has returned, now or during an earlier activation
    Ok = 0,
    /// The coroutine yielded and can be resumed again
    Again = -11,
}

/// Errors reported by the control API
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Error {
    /// The stack could not be allocated
    NoMem = -12,
    /// Bad parameter: buffer too small, or resuming the running coroutine
    Inval = -22,
}

impl Status {
    /// Numeric code
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Decode a value delivered across a context switch
    pub const fn from_code(code: isize) -> Option<Self> {
        match code {
            0 => Some(Status::Ok),
            -11 => Some(Status::Again),
            _ => None,
        }
    }
}

impl Error {
    /// Numeric code
    pub const fn code(self) -> i32 {
        self as i32
    }

    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            -12 => Some(Error::NoMem),
            -22 => Some(Error::Inval),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "coroutine finished"),
            Status::Again => write!(f, "coroutine suspended, try again"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoMem => write!(f, "out of memory for coroutine stack"),
            Error::Inval => write!(f, "invalid parameter"),
        }
    }
}

impl core::error::Error for Error {}

impl From<coru_platform::InitError> for Error {
    fn from(err: coru_platform::InitError) -> Self {
        match err {
            coru_platform::InitError::TooSmall => Error::Inval,
        }
    }
}
