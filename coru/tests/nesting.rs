// A coroutine driving another one: yields go to the nearest resumer

use core::cell::RefCell;
use core::ffi::c_void;

use coru::{yield_now, Coroutine, Status};

const STACK: usize = 64 * 1024;

struct Shared {
    log: RefCell<Vec<&'static str>>,
    inner: RefCell<Option<Coroutine<'static>>>,
}

impl Shared {
    fn push(&self, event: &'static str) {
        self.log.borrow_mut().push(event);
    }

    /// Resume the inner coroutine without holding a borrow across the switch.
    fn resume_inner(&self) -> Status {
        let mut inner = self.inner.borrow_mut().take().unwrap();
        let status = inner.resume().unwrap();
        *self.inner.borrow_mut() = Some(inner);
        status
    }
}

extern "C" fn inner_body(data: *mut c_void) {
    let shared = unsafe { &*(data as *const Shared) };
    shared.push("inner:1");
    yield_now();
    shared.push("inner:2");
}

extern "C" fn outer_body(data: *mut c_void) {
    let shared = unsafe { &*(data as *const Shared) };
    shared.push("outer:1");
    let status = shared.resume_inner();
    shared.push(if status == Status::Again { "outer:inner-again" } else { "outer:inner-ok" });
    yield_now();
    shared.push("outer:2");
    let status = shared.resume_inner();
    shared.push(if status == Status::Again { "outer:inner-again" } else { "outer:inner-ok" });
}

#[test]
fn inner_yield_returns_to_outer() {
    let shared = Shared {
        log: RefCell::new(Vec::new()),
        inner: RefCell::new(None),
    };
    let data = &shared as *const Shared as *mut c_void;
    *shared.inner.borrow_mut() = Some(Coroutine::create(inner_body, data, STACK).unwrap());
    let mut outer = Coroutine::create(outer_body, data, STACK).unwrap();

    assert_eq!(outer.resume(), Ok(Status::Again));
    assert_eq!(
        *shared.log.borrow(),
        ["outer:1", "inner:1", "outer:inner-again"]
    );

    assert_eq!(outer.resume(), Ok(Status::Ok));
    assert_eq!(
        shared.log.borrow()[3..],
        ["outer:2", "inner:2", "outer:inner-ok"]
    );

    let inner = shared.inner.borrow_mut().take().unwrap();
    assert!(inner.is_finished());
    assert_eq!(inner.activations(), 2);
    inner.destroy();
    outer.destroy();
}

extern "C" fn chain(data: *mut c_void) {
    let depth = data as usize;
    if depth > 0 {
        let mut next = Coroutine::create(chain, (depth - 1) as *mut c_void, STACK).unwrap();
        assert_eq!(next.resume(), Ok(Status::Again));
        yield_now();
        assert_eq!(next.resume(), Ok(Status::Ok));
        next.destroy();
    } else {
        yield_now();
    }
}

#[test]
fn deep_chain_unwinds_in_order() {
    let mut root = Coroutine::create(chain, 8 as *mut c_void, STACK).unwrap();
    assert_eq!(root.resume(), Ok(Status::Again));
    assert_eq!(root.resume(), Ok(Status::Ok));
    assert!(!coru::in_coroutine());
}
