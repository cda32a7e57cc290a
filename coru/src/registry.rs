//! Active-context registry
//!
//! A single slot naming the descriptor that currently owns the native call
//! stack, i.e. the one the next [`yield_now`](crate::yield_now) suspends.
//! `resume` saves the slot, installs its own descriptor and restores the saved
//! value once control comes back, so nested activations unwind in order.
//!
//! With `std` the slot is thread local. Without it there is one slot for the
//! whole program, guarded by a critical section; only one execution thread may
//! drive coroutines in that configuration.

use core::cell::Cell;
use core::ptr;

use crate::coroutine::Descriptor;

#[derive(Clone, Copy)]
struct ActivePtr(*mut Descriptor);

// only ever dereferenced by the execution thread that installed it
unsafe impl Send for ActivePtr {}

#[cfg(feature = "std")]
std::thread_local! {
    static ACTIVE: Cell<ActivePtr> = const { Cell::new(ActivePtr(ptr::null_mut())) };
}

#[cfg(not(feature = "std"))]
static ACTIVE: critical_section::Mutex<Cell<ActivePtr>> =
    critical_section::Mutex::new(Cell::new(ActivePtr(ptr::null_mut())));

#[cfg(feature = "std")]
#[inline]
fn with_slot<R>(f: impl FnOnce(&Cell<ActivePtr>) -> R) -> R {
    ACTIVE.with(f)
}

#[cfg(not(feature = "std"))]
#[inline]
fn with_slot<R>(f: impl FnOnce(&Cell<ActivePtr>) -> R) -> R {
    critical_section::with(|cs| f(ACTIVE.borrow(cs)))
}

/// The running descriptor, null on the root context.
#[inline]
pub(crate) fn current() -> *mut Descriptor {
    with_slot(|slot| slot.get().0)
}

/// Install `desc` and hand back the previous value for [`restore`].
#[inline]
pub(crate) fn replace(desc: *mut Descriptor) -> *mut Descriptor {
    with_slot(|slot| slot.replace(ActivePtr(desc)).0)
}

#[inline]
pub(crate) fn restore(prev: *mut Descriptor) {
    with_slot(|slot| slot.set(ActivePtr(prev)));
}
