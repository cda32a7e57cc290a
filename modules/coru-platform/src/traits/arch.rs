//! Context switch capability trait definition

use core::ffi::c_void;
use core::ptr::NonNull;

/// Signature of a coroutine body.
pub type Callback = extern "C" fn(*mut c_void);

/// Signature of the routine a coroutine lands in once its body returns.
pub type Halt = extern "C" fn() -> !;

/// Everything a fresh frame has to thread through to the first activation.
#[derive(Clone, Copy)]
pub struct Entry {
    /// The coroutine body
    pub callback: Callback,
    /// Opaque argument handed to `callback`
    pub data: *mut c_void,
    /// Where control goes when `callback` returns
    pub halt: Halt,
}

impl Entry {
    #[inline]
    pub(crate) fn callback_addr(&self) -> usize {
        self.callback as *const () as usize
    }

    #[inline]
    pub(crate) fn data_addr(&self) -> usize {
        self.data as usize
    }

    #[inline]
    pub(crate) fn halt_addr(&self) -> usize {
        self.halt as *const () as usize
    }
}

/// Architecture specific context handling
///
/// This trait isolates every piece of instruction-set knowledge the engine needs:
/// the layout of the callee-saved register block, how a fresh block threads the
/// callback into its first activation, and the routine that swaps two stacks.
/// Exactly one implementation is compiled in, selected by `target_arch`.
pub trait Arch {
    /// Register-save block in the exact order the switch routine pops it,
    /// lowest address first.
    ///
    /// Its size must keep the stack pointer aligned as the ABI requires once
    /// the block has been popped.
    type Frame;

    /// Build the block that makes a fresh stack look like it was suspended
    /// inside the switch routine.
    ///
    /// Registers not used to carry `entry` are zero.
    fn initial_frame(entry: &Entry) -> Self::Frame;

    /// Save the current context, swap the live stack pointer with `*slot`,
    /// restore the other context and hand it `arg`.
    ///
    /// Returns the `arg` of the call that later switches back into us.
    ///
    /// # Safety
    /// `*slot` must hold a stack pointer produced by [`Arch::initial_frame`]
    /// placement or by an earlier switch away from a context that is still live.
    unsafe fn switch(slot: *mut *mut u8, arg: isize) -> isize;

    /// Location of the overflow sentinel for a stack starting at `base`.
    ///
    /// All backends use the lowest word of the region, the last one a
    /// downward-growing stack reaches.
    fn canary_slot(base: NonNull<usize>) -> Option<NonNull<usize>> {
        Some(base)
    }
}
