//! Stack memory for coroutines built by the allocating constructors
/*
********************************************************************************************************************************************
*                                                               type define
********************************************************************************************************************************************
*/

use core::alloc::Layout;
use core::fmt;
use core::ptr::NonNull;

use coru_platform::{MIN_STACK_SIZE, STACK_ALIGN, WORD};

use crate::error::Error;

/// Source of coroutine stacks
///
/// # Safety
/// `allocate` must return memory valid for reads and writes of
/// `layout.size()` bytes, aligned to `layout.align()`, and not handed out again
/// before it is passed back to `deallocate`.
pub unsafe trait StackAllocator: Sync {
    /// Allocate a stack, `None` when memory is exhausted.
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Release a stack obtained from `allocate` with the same `layout`.
    ///
    /// # Safety
    /// `ptr` must come from this allocator's `allocate` with `layout`.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The global heap allocator
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Global;

#[cfg(feature = "alloc")]
unsafe impl StackAllocator for Global {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        // layouts reaching here are never zero sized, see OwnedStack::new
        NonNull::new(unsafe { alloc::alloc::alloc(layout) })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { alloc::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

/// A stack owned by its coroutine, released on drop
pub(crate) struct OwnedStack {
    /// lowest word of the region, holds the canary
    base: NonNull<usize>,
    layout: Layout,
    allocator: &'static dyn StackAllocator,
}

/*
********************************************************************************************************************************************
*                                                           interface
********************************************************************************************************************************************
*/

impl OwnedStack {
    /// Allocate `size` bytes, rounded down to whole words.
    ///
    /// Sizes below [`MIN_STACK_SIZE`] are rejected before touching the allocator.
    pub(crate) fn new(size: usize, allocator: &'static dyn StackAllocator) -> Result<Self, Error> {
        let size = size & !(WORD - 1);
        if size < MIN_STACK_SIZE {
            mem_log!(warn, "stack of {} bytes is below the minimum of {}", size, MIN_STACK_SIZE);
            return Err(Error::Inval);
        }
        let layout = Layout::from_size_align(size, STACK_ALIGN).map_err(|_| Error::NoMem)?;
        let Some(ptr) = allocator.allocate(layout) else {
            mem_log!(warn, "alloc_stack: out of memory for {} bytes", size);
            return Err(Error::NoMem);
        };
        mem_log!(trace, "alloc a stack at {:#x}, {} bytes", ptr.as_ptr() as usize, size);
        Ok(OwnedStack {
            base: ptr.cast(),
            layout,
            allocator,
        })
    }

    #[inline]
    pub(crate) fn base(&self) -> NonNull<usize> {
        self.base
    }

    /// Size in machine words
    #[inline]
    pub(crate) fn words(&self) -> usize {
        self.layout.size() / WORD
    }
}

/// we impl drop for OwnedStack to dealloc the stack
impl Drop for OwnedStack {
    fn drop(&mut self) {
        mem_log!(trace, "dealloc_stack at {:#x}", self.base.as_ptr() as usize);
        unsafe {
            self.allocator.deallocate(self.base.cast(), self.layout);
        }
    }
}

impl fmt::Debug for OwnedStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedStack")
            .field("base", &self.base)
            .field("size", &self.layout.size())
            .finish()
    }
}
