//! Coroutine descriptor and control API
//!
//! A coroutine is created suspended at the very top of its stack: the frame
//! built by the platform layer makes the first `resume` return into the
//! callback as if it were the second half of an ordinary switch. When the
//! callback returns, control falls into [`halt`], which reports completion to
//! the resumer.

use core::ffi::c_void;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

use coru_platform::{init_stack, Arch, ArchImpl, Callback, Entry, WORD};

use crate::error::{Error, Status};
use crate::registry;
#[cfg(feature = "alloc")]
use crate::stack::Global;
use crate::stack::{OwnedStack, StackAllocator};

/// Sentinel stored in the lowest word of every stack ("coru" in ASCII)
pub const CANARY: usize = 0x636f_7275;

/// Lifecycle of a coroutine
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Created, never resumed
    NotStarted,
    /// Parked in `yield_now`
    Suspended,
    /// Owns the call stack right now
    Running,
    /// The callback returned; resuming is a no-op
    Halted,
}

/// The part of a coroutine the context switch and the registry touch
pub(crate) struct Descriptor {
    /// Saved stack pointer. Holds the coroutine's context while it is
    /// suspended and the resumer's context while it runs.
    sp: *mut u8,
    canary: Option<NonNull<usize>>,
    state: State,
    activations: u32,
}

enum Storage<'a> {
    Owned(OwnedStack),
    Borrowed {
        words: usize,
        _buffer: PhantomData<&'a mut [usize]>,
    },
}

/// A stackful coroutine
///
/// The coroutine runs `callback(data)` on its own stack. Each
/// [`resume`](Coroutine::resume) runs it until it calls [`yield_now`] or
/// returns.
///
/// Dropping a coroutine that has not finished releases its stack without
/// unwinding it, whatever its frames own is leaked.
pub struct Coroutine<'a> {
    desc: Descriptor,
    stack: Storage<'a>,
}

impl Coroutine<'static> {
    /// Create a coroutine on a freshly allocated stack of `size` bytes.
    ///
    /// Returns [`Error::NoMem`] when the stack cannot be allocated and
    /// [`Error::Inval`] when `size` is below [`MIN_STACK_SIZE`](crate::MIN_STACK_SIZE).
    #[cfg(feature = "alloc")]
    pub fn create(callback: Callback, data: *mut c_void, size: usize) -> Result<Self, Error> {
        Self::create_in(callback, data, size, &Global)
    }

    /// Create a coroutine whose stack comes from `allocator`.
    ///
    /// Needs no heap by itself, `allocator` may hand out pool or static memory.
    pub fn create_in(
        callback: Callback,
        data: *mut c_void,
        size: usize,
        allocator: &'static dyn StackAllocator,
    ) -> Result<Self, Error> {
        let stack = OwnedStack::new(size, allocator)?;
        // on failure `stack` is dropped here, which frees it
        let desc = unsafe { Descriptor::init(callback, data, stack.base(), stack.words())? };
        coro_log!(debug, "create: {} byte stack", stack.words() * WORD);
        Ok(Coroutine {
            desc,
            stack: Storage::Owned(stack),
        })
    }
}

impl<'a> Coroutine<'a> {
    /// Create a coroutine running on caller-provided memory.
    ///
    /// The buffer stays borrowed for the coroutine's lifetime and is never
    /// freed by it. Returns [`Error::Inval`] when it cannot hold the canary word
    /// and the register frame.
    pub fn create_inplace(
        callback: Callback,
        data: *mut c_void,
        buffer: &'a mut [usize],
    ) -> Result<Self, Error> {
        let words = buffer.len();
        let base = NonNull::from(buffer).cast::<usize>();
        let desc = unsafe { Descriptor::init(callback, data, base, words)? };
        coro_log!(debug, "create_inplace: {} byte stack at {:#x}", words * WORD, base.as_ptr() as usize);
        Ok(Coroutine {
            desc,
            stack: Storage::Borrowed {
                words,
                _buffer: PhantomData,
            },
        })
    }

    /// Release the coroutine and its stack if it owns one.
    ///
    /// Same as dropping it.
    pub fn destroy(self) {
        coro_log!(debug, "destroy: state {:?}", self.desc.state);
        drop(self);
    }

    /// Run the coroutine until it yields or its callback returns.
    ///
    /// Returns [`Status::Again`] when it yielded and [`Status::Ok`] when the
    /// callback returned, during this call or an earlier one. Resuming a
    /// finished coroutine does not switch stacks.
    ///
    /// A coroutine may resume another one; a yield always returns to its
    /// nearest resumer. Resuming the coroutine that is currently running is
    /// reported as [`Error::Inval`].
    pub fn resume(&mut self) -> Result<Status, Error> {
        match self.desc.state {
            State::Halted => return Ok(Status::Ok),
            State::Running => {
                coro_log!(warn, "resume: coroutine is already running");
                return Err(Error::Inval);
            }
            State::NotStarted | State::Suspended => {}
        }
        let desc: *mut Descriptor = &mut self.desc;
        Ok(unsafe { Descriptor::activate(desc) })
    }

    /// Current lifecycle state
    pub fn state(&self) -> State {
        self.desc.state
    }

    /// Whether the callback has returned
    pub fn is_finished(&self) -> bool {
        self.desc.state == State::Halted
    }

    /// Number of times the coroutine has been switched into
    pub fn activations(&self) -> u32 {
        self.desc.activations
    }

    /// Whether the overflow sentinel still holds its value.
    ///
    /// Unlike the check in [`yield_now`] this never aborts. Always `true` when
    /// the backend has no canary slot.
    pub fn canary_intact(&self) -> bool {
        self.desc.canary_intact()
    }

    /// Stack size in bytes
    pub fn stack_size(&self) -> usize {
        let words = match &self.stack {
            Storage::Owned(stack) => stack.words(),
            Storage::Borrowed { words, .. } => *words,
        };
        words * WORD
    }

    /// Whether the stack was allocated by the coroutine
    pub fn is_owned(&self) -> bool {
        matches!(self.stack, Storage::Owned(_))
    }
}

impl fmt::Debug for Coroutine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coroutine")
            .field("state", &self.desc.state)
            .field("sp", &self.desc.sp)
            .field("stack_size", &self.stack_size())
            .field("owned", &self.is_owned())
            .finish()
    }
}

impl Descriptor {
    /// Lay out a fresh frame in the region and arm the canary.
    ///
    /// # Safety
    /// `base` must be valid for `words` machine words for as long as the
    /// descriptor is used.
    unsafe fn init(
        callback: Callback,
        data: *mut c_void,
        base: NonNull<usize>,
        words: usize,
    ) -> Result<Self, Error> {
        let entry = Entry {
            callback,
            data,
            halt,
        };
        let frame = unsafe { init_stack::<ArchImpl>(base, words, &entry)? };
        if let Some(canary) = frame.canary {
            unsafe { canary.as_ptr().write_volatile(CANARY) };
        }
        Ok(Descriptor {
            sp: frame.sp,
            canary: frame.canary,
            state: State::NotStarted,
            activations: 0,
        })
    }

    /// Switch into `desc` and come back once it yields or finishes.
    ///
    /// # Safety
    /// `desc` must be resumable (not running, not halted) and stay in place
    /// until this returns.
    unsafe fn activate(desc: *mut Descriptor) -> Status {
        // push previous coroutine's info on the current stack
        let prev = registry::replace(desc);
        unsafe {
            (*desc).state = State::Running;
            (*desc).activations = (*desc).activations.wrapping_add(1);
        }

        let code = unsafe { ArchImpl::switch(ptr::addr_of_mut!((*desc).sp), Status::Ok.code() as isize) };

        // restore previous coroutine's info
        registry::restore(prev);
        // only yield_now (Again) and halt (Ok) switch back here
        let (status, state) = if code == Status::Ok.code() as isize {
            (Status::Ok, State::Halted)
        } else {
            (Status::Again, State::Suspended)
        };
        unsafe {
            (*desc).state = state;
        }
        coro_log!(trace, "resume: {:?}", status);
        status
    }

    fn canary_intact(&self) -> bool {
        match self.canary {
            Some(canary) => unsafe { canary.as_ptr().read_volatile() == CANARY },
            None => true,
        }
    }

    /// Abort on a clobbered canary, the extent of the damage is unknown.
    fn check_canary(&self) {
        if !self.canary_intact() {
            stack_overflow(self);
        }
    }
}

#[cold]
#[inline(never)]
fn stack_overflow(desc: &Descriptor) -> ! {
    error!(
        "coroutine stack overflow, canary at {:#x} clobbered",
        desc.canary.map_or(0, |c| c.as_ptr() as usize)
    );
    #[cfg(feature = "std")]
    std::process::abort();
    #[cfg(not(feature = "std"))]
    panic!("coroutine stack overflow");
}

/// Suspend the running coroutine, returning control to its resumer.
///
/// Execution continues here on the next `resume` of the same coroutine.
/// Does nothing when called outside any coroutine, so code shared with
/// non-coroutine callers can yield unconditionally.
///
/// Aborts the process when the coroutine's stack canary has been
/// overwritten.
pub fn yield_now() {
    let active = registry::current();
    // do nothing if we are not a coroutine
    if active.is_null() {
        return;
    }
    unsafe {
        (*active).check_canary();
        ArchImpl::switch(ptr::addr_of_mut!((*active).sp), Status::Again.code() as isize);
    }
}

/// Whether the caller runs inside a coroutine
pub fn in_coroutine() -> bool {
    !registry::current().is_null()
}

/// Landing point of a returning callback, never called directly.
///
/// Answers `Ok` forever; `resume` stops switching into a halted coroutine, so
/// in practice it runs once per coroutine.
extern "C" fn halt() -> ! {
    loop {
        let active = registry::current();
        if active.is_null() {
            error!("halt reached without an active coroutine");
            #[cfg(feature = "std")]
            std::process::abort();
            #[cfg(not(feature = "std"))]
            panic!("halt reached without an active coroutine");
        }
        unsafe {
            (*active).check_canary();
            ArchImpl::switch(ptr::addr_of_mut!((*active).sp), Status::Ok.code() as isize);
        }
    }
}
