// Who owns the stack: allocating constructors versus caller buffers

use std::alloc::Layout;
use std::cell::UnsafeCell;
use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use coru::{yield_now, Coroutine, Error, Global, StackAllocator, Status, CANARY, MIN_STACK_SIZE};

const STACK: usize = 32 * 1024;

struct Tracking {
    fail: AtomicBool,
    allocs: AtomicUsize,
    frees: AtomicUsize,
}

unsafe impl StackAllocator for Tracking {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        if self.fail.load(Ordering::SeqCst) {
            return None;
        }
        self.allocs.fetch_add(1, Ordering::SeqCst);
        Global.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.frees.fetch_add(1, Ordering::SeqCst);
        unsafe { Global.deallocate(ptr, layout) }
    }
}

static TRACKING: Tracking = Tracking {
    fail: AtomicBool::new(false),
    allocs: AtomicUsize::new(0),
    frees: AtomicUsize::new(0),
};

// the counters are shared by every test in this file
static SERIAL: Mutex<()> = Mutex::new(());

fn counts() -> (usize, usize) {
    (
        TRACKING.allocs.load(Ordering::SeqCst),
        TRACKING.frees.load(Ordering::SeqCst),
    )
}

extern "C" fn yield_once(_: *mut c_void) {
    yield_now();
}

#[test]
fn destroy_releases_owned_stack() {
    let _guard = SERIAL.lock().unwrap();
    let (allocs, frees) = counts();

    let mut co = Coroutine::create_in(yield_once, std::ptr::null_mut(), STACK, &TRACKING).unwrap();
    assert!(co.is_owned());
    assert_eq!(co.stack_size(), STACK);
    assert_eq!(counts(), (allocs + 1, frees));

    assert_eq!(co.resume(), Ok(Status::Again));
    co.destroy();
    assert_eq!(counts(), (allocs + 1, frees + 1));
}

#[test]
fn dropping_unfinished_coroutine_releases_stack() {
    let _guard = SERIAL.lock().unwrap();
    let (allocs, frees) = counts();

    let mut co = Coroutine::create_in(yield_once, std::ptr::null_mut(), STACK, &TRACKING).unwrap();
    assert_eq!(co.resume(), Ok(Status::Again));
    drop(co);
    assert_eq!(counts(), (allocs + 1, frees + 1));
}

#[test]
fn allocation_failure_is_nomem() {
    let _guard = SERIAL.lock().unwrap();
    let before = counts();

    TRACKING.fail.store(true, Ordering::SeqCst);
    let err = Coroutine::create_in(yield_once, std::ptr::null_mut(), STACK, &TRACKING).unwrap_err();
    TRACKING.fail.store(false, Ordering::SeqCst);

    assert_eq!(err, Error::NoMem);
    assert_eq!(err.code(), -12);
    assert_eq!(counts(), before);
}

#[test]
fn undersized_stack_never_reaches_allocator() {
    let _guard = SERIAL.lock().unwrap();
    let before = counts();
    let err = Coroutine::create_in(yield_once, std::ptr::null_mut(), 8, &TRACKING).unwrap_err();
    assert_eq!(err, Error::Inval);
    assert_eq!(counts(), before);
}

#[test]
fn inplace_buffer_is_borrowed_not_freed() {
    let mut buf = vec![0usize; STACK / std::mem::size_of::<usize>()];
    let len = buf.len();
    {
        let mut co = Coroutine::create_inplace(yield_once, std::ptr::null_mut(), &mut buf).unwrap();
        assert!(!co.is_owned());
        assert_eq!(co.resume(), Ok(Status::Again));
        assert_eq!(co.resume(), Ok(Status::Ok));
        co.destroy();
    }
    // still ours, still the same length, canary untouched by a well-behaved body
    assert_eq!(buf.len(), len);
    assert_eq!(buf[0], CANARY);
    buf.fill(1);
}

#[test]
fn inplace_too_small_is_inval() {
    let mut empty: [usize; 0] = [];
    assert_eq!(
        Coroutine::create_inplace(yield_once, std::ptr::null_mut(), &mut empty).unwrap_err(),
        Error::Inval
    );

    let mut tiny = [0usize; 2];
    assert_eq!(
        Coroutine::create_inplace(yield_once, std::ptr::null_mut(), &mut tiny).unwrap_err(),
        Error::Inval
    );
    assert_eq!(tiny, [0, 0]);
}

#[test]
fn inplace_minimum_size_runs() {
    // headroom above the minimum for the callback's own frames
    let words = MIN_STACK_SIZE / std::mem::size_of::<usize>() + 512;
    let mut buf = vec![0usize; words];
    let mut co = Coroutine::create_inplace(yield_once, std::ptr::null_mut(), &mut buf).unwrap();
    assert_eq!(co.resume(), Ok(Status::Again));
    assert_eq!(co.resume(), Ok(Status::Ok));
    assert!(co.canary_intact());
}

const POOL_SIZE: usize = 32 * 1024;

/// One stack's worth of static memory, handed out to a single owner at a time
struct Pool {
    arena: Arena,
    taken: AtomicBool,
}

#[repr(C, align(16))]
struct Arena(UnsafeCell<[u8; POOL_SIZE]>);

unsafe impl Sync for Pool {}

unsafe impl StackAllocator for Pool {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        if layout.size() > POOL_SIZE || layout.align() > 16 {
            return None;
        }
        if self.taken.swap(true, Ordering::SeqCst) {
            return None;
        }
        NonNull::new(self.arena.0.get().cast::<u8>())
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {
        self.taken.store(false, Ordering::SeqCst);
    }
}

static POOL: Pool = Pool {
    arena: Arena(UnsafeCell::new([0; POOL_SIZE])),
    taken: AtomicBool::new(false),
};

#[test]
fn create_in_runs_on_static_pool() {
    let mut co = Coroutine::create_in(yield_once, std::ptr::null_mut(), POOL_SIZE, &POOL).unwrap();
    assert!(co.is_owned());
    let base = POOL.arena.0.get() as usize;
    assert_eq!(unsafe { *(base as *const usize) }, CANARY);

    // the pool holds one stack only
    let err = Coroutine::create_in(yield_once, std::ptr::null_mut(), POOL_SIZE, &POOL).unwrap_err();
    assert_eq!(err, Error::NoMem);

    assert_eq!(co.resume(), Ok(Status::Again));
    assert_eq!(co.resume(), Ok(Status::Ok));
    co.destroy();

    // returned on destroy, so it can be handed out again
    let again = Coroutine::create_in(yield_once, std::ptr::null_mut(), POOL_SIZE, &POOL).unwrap();
    again.destroy();
}
