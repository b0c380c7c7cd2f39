//! A `Waker` that does nothing when woken.
//!
//! The executor never relies on real wake notifications — it re-polls every
//! pending future on every tick and decides how far to advance the virtual
//! clock from the deadlines those futures report. A waker is still required
//! by `Future::poll`'s signature, so this supplies an inert one.

use std::task::{RawWaker, RawWakerVTable, Waker};

const VTABLE: RawWakerVTable = RawWakerVTable::new(clone, wake, wake_by_ref, drop);

fn clone(_: *const ()) -> RawWaker {
    RawWaker::new(std::ptr::null(), &VTABLE)
}
fn wake(_: *const ()) {}
fn wake_by_ref(_: *const ()) {}
fn drop(_: *const ()) {}

pub fn noop_waker() -> Waker {
    let raw = RawWaker::new(std::ptr::null(), &VTABLE);
    unsafe { Waker::from_raw(raw) }
}
