#![no_std]

//! A minimal stackful coroutine engine
//!
//! Each [`Coroutine`] runs a plain `extern "C"` callback on a private stack.
//! [`Coroutine::resume`] transfers control into it, [`yield_now`] hands control
//! back to whoever resumed it. Coroutines may resume other coroutines, a yield
//! always returns to the nearest resumer.
//!
//! ```no_run
//! use core::ffi::c_void;
//! use coru::{yield_now, Coroutine, Status};
//!
//! extern "C" fn count(data: *mut c_void) {
//!     let n = unsafe { &mut *(data as *mut u32) };
//!     for _ in 0..3 {
//!         *n += 1;
//!         yield_now();
//!     }
//! }
//!
//! let mut n = 0u32;
//! let mut co = Coroutine::create(count, &mut n as *mut u32 as *mut c_void, 16 * 1024).unwrap();
//! while co.resume() == Ok(Status::Again) {}
//! co.destroy();
//! ```
//!
//! ## Organization
//!
//! - [`error`]: status and error codes
//! - [`stack`]: stack memory and the [`StackAllocator`] hook
//!
//! Without the `alloc` feature (on by default through `std`) there is no
//! `Coroutine::create`; stacks come from caller buffers or a
//! [`StackAllocator`] passed to `Coroutine::create_in`.
//!
//! The architecture specific parts live in the `coru-platform` crate.

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "alloc")]
extern crate alloc;

#[macro_use]
extern crate coru_log;

mod coroutine;
pub mod error;
mod registry;
pub mod stack;

pub use coroutine::{in_coroutine, yield_now, Coroutine, State, CANARY};
pub use coru_platform::{Callback, MIN_STACK_SIZE, STACK_ALIGN};
pub use error::{Error, Status};
#[cfg(feature = "alloc")]
pub use stack::Global;
pub use stack::StackAllocator;
