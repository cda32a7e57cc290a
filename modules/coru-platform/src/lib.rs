#![no_std]
#![cfg_attr(target_arch = "mips", feature(asm_experimental_arch))]

//! Architecture abstraction layer for the coru coroutine engine
//!
//! This crate owns every piece of instruction-set specific knowledge: the
//! callee-saved register block each backend pushes, the frame that makes a fresh
//! stack look suspended, the entry trampolines and the context switch routine.
//!
//! ## Organization
//!
//! - [`traits`]: the [`Arch`] capability trait
//! - [`arch`]: the backend selected for the current target
//!
//! ## Backends
//!
//! x86, x86_64, ARM Thumb, MIPS o32, AArch64 and RISC-V 64, ELF targets only.
//! Any other target fails the build. Thumb targets with the hard-float ABI
//! (`*-eabihf`) also save s16-s31. MIPS needs a nightly compiler for
//! `asm_experimental_arch`.

#[macro_use]
extern crate coru_log;

// Declare modules
pub mod arch;
pub mod traits;

#[cfg(test)]
mod target;

use core::fmt;
use core::mem::size_of;
use core::ptr::NonNull;

// Re-export traits for convenience
pub use arch::ArchImpl;
pub use traits::arch::{Callback, Halt};
pub use traits::{Arch, Entry};

/// Machine word size in bytes
pub const WORD: usize = size_of::<usize>();

/// Alignment of the stack top handed to a fresh coroutine.
///
/// 16 bytes satisfies every supported ABI.
pub const STACK_ALIGN: usize = 16;

/// Smallest region, in bytes, [`init_stack`] accepts for the compiled backend.
///
/// Covers the canary word, the register block and the worst-case alignment
/// padding at the top of a word-aligned region.
pub const MIN_STACK_SIZE: usize = size_of::<<ArchImpl as Arch>::Frame>() + STACK_ALIGN;

/// Result of laying out a fresh stack
#[derive(Debug, Clone, Copy)]
pub struct InitFrame {
    /// Initial saved stack pointer, ready for the first switch
    pub sp: *mut u8,
    /// Sentinel slot, `None` when the backend has none
    pub canary: Option<NonNull<usize>>,
}

/// Frame construction failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// The region cannot hold the register block above the canary word
    TooSmall,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::TooSmall => write!(f, "stack region too small for the register frame"),
        }
    }
}

impl core::error::Error for InitError {}

/// Lay out the initial frame of a coroutine stack.
///
/// The top of the region is aligned down to [`STACK_ALIGN`] and the backend's
/// register block is written directly below it. The lowest word is left for
/// the canary, the caller writes the sentinel.
///
/// # Safety
/// `base` must be valid for writes of `words` machine words and must stay
/// valid for as long as the returned stack pointer is switched into.
pub unsafe fn init_stack<A: Arch>(
    base: NonNull<usize>,
    words: usize,
    entry: &Entry,
) -> Result<InitFrame, InitError> {
    let start = base.as_ptr() as usize;
    let end = words
        .checked_mul(WORD)
        .and_then(|len| start.checked_add(len))
        .ok_or(InitError::TooSmall)?;
    let top = end & !(STACK_ALIGN - 1);
    let frame_start = top
        .checked_sub(size_of::<A::Frame>())
        .ok_or(InitError::TooSmall)?;
    // the frame must not overlap the canary word
    if frame_start < start + WORD {
        return Err(InitError::TooSmall);
    }

    let frame = frame_start as *mut A::Frame;
    unsafe {
        frame.write(A::initial_frame(entry));
    }
    switch_log!(
        trace,
        "init_stack: base={:#x} top={:#x} sp={:#x}",
        start,
        top,
        frame_start
    );

    Ok(InitFrame {
        sp: frame as *mut u8,
        canary: A::canary_slot(base),
    })
}

#[cfg(test)]
extern crate std;
