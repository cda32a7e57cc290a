//! Logging macros for the coru coroutine engine
//!
//! This crate provides logging macros that wrap around either `defmt` (embedded
//! targets) or the `log` facade (hosted targets).
//! When no backend feature is enabled, the macros become no-ops so that the
//! context switch path carries no formatting cost.

#![no_std]

#[cfg(feature = "log")]
#[doc(hidden)]
pub use log as __log_backend;

#[cfg(feature = "defmt")]
#[doc(hidden)]
pub use defmt as __defmt_backend;

// Define all core logging macros
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => { $crate::__log!(debug, $($arg)*) };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::__log!(error, $($arg)*) };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::__log!(info, $($arg)*) };
}

#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => { $crate::__log!(trace, $($arg)*) };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::__log!(warn, $($arg)*) };
}

// Forward to defmt, log, or become no-op based on features
#[cfg(feature = "defmt")]
#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($level:ident, $($arg:tt)*) => {
        $crate::__defmt_backend::$level!($($arg)*)
    };
}

#[cfg(all(feature = "log", not(feature = "defmt")))]
#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($level:ident, $($arg:tt)*) => {
        $crate::__log_backend::$level!(target: "coru", $($arg)*)
    };
}

// No backend: arguments are still borrowed, never evaluated
#[cfg(not(any(feature = "log", feature = "defmt")))]
#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($level:ident, $fmt:literal $(, $arg:expr)* $(,)?) => {
        if false {
            $(let _ = &$arg;)*
        }
    };
}

// Coroutine lifecycle logging macros
#[cfg(feature = "log-coro")]
#[macro_export]
macro_rules! coro_log {
    ($level:ident, $($args:tt)*) => { $crate::$level!($($args)*); };
}

#[cfg(not(feature = "log-coro"))]
#[macro_export]
macro_rules! coro_log {
    ($level:ident, $($args:tt)*) => {};
}

// Frame construction and switch logging macros
#[cfg(feature = "log-switch")]
#[macro_export]
macro_rules! switch_log {
    ($level:ident, $($args:tt)*) => { $crate::$level!($($args)*); };
}

#[cfg(not(feature = "log-switch"))]
#[macro_export]
macro_rules! switch_log {
    ($level:ident, $($args:tt)*) => {};
}

// Stack memory logging macros
#[cfg(feature = "log-mem")]
#[macro_export]
macro_rules! mem_log {
    ($level:ident, $($args:tt)*) => { $crate::$level!($($args)*); };
}

#[cfg(not(feature = "log-mem"))]
#[macro_export]
macro_rules! mem_log {
    ($level:ident, $($args:tt)*) => {};
}

#[cfg(test)]
extern crate std;
