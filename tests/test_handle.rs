//! Ownership lifecycle tests for `OwningHandle`.

use std::cell::RefCell;
use std::rc::Rc;

use unique::{Delete, DeleteArray, DropFailure, Error, OwningHandle, Release, ReleaseFn};

/// Records every resource its policy releases.
#[derive(Default, Clone)]
struct Ledger(Rc<RefCell<Vec<u32>>>);

impl Ledger {
    fn handle(&self, raw: u32) -> OwningHandle<u32, Ledger> {
        OwningHandle::with_policy(raw, self.clone())
    }

    fn released(&self) -> Vec<u32> {
        self.0.borrow().clone()
    }
}

impl Release<u32> for Ledger {
    type Raw = u32;

    fn release(&mut self, raw: u32) -> unique::Result<()> {
        self.0.borrow_mut().push(raw);
        Ok(())
    }
}

/// Increments a shared counter when dropped.
struct Resource {
    drops: Rc<RefCell<u32>>,
}

impl Drop for Resource {
    fn drop(&mut self) {
        *self.drops.borrow_mut() += 1;
    }
}

#[test]
fn test_basic_lifecycle() {
    let ledger = Ledger::default();
    {
        let handle = ledger.handle(11);
        assert_eq!(handle.get(), Some(&11), "get should return the bound resource");
        assert!(ledger.released().is_empty(), "nothing released while owning");
    }
    assert_eq!(ledger.released(), [11], "drop should release exactly once");
}

#[test]
fn test_empty_handle_drop_releases_nothing() {
    let ledger = Ledger::default();
    {
        let handle = OwningHandle::<u32, _>::empty_with(ledger.clone());
        assert!(handle.is_empty());
        assert_eq!(handle.get(), None);
    }
    assert!(ledger.released().is_empty(), "empty handle should not release");
}

#[test]
fn test_move_transfers_without_release() {
    let ledger = Ledger::default();
    let h1 = ledger.handle(5);
    let h2 = h1;
    assert_eq!(h2.get(), Some(&5));
    assert!(ledger.released().is_empty(), "a move must not release");
    drop(h2);
    assert_eq!(ledger.released(), [5]);
}

#[test]
fn test_take_leaves_source_empty() {
    let drops = Rc::new(RefCell::new(0));
    let mut h1 = OwningHandle::new(Resource {
        drops: Rc::clone(&drops),
    });
    let h2 = h1.take();

    assert!(h1.is_empty(), "source should be empty after take");
    assert!(h2.is_owning(), "target should own the resource");
    assert_eq!(*drops.borrow(), 0, "take must not release");

    drop(h1);
    assert_eq!(*drops.borrow(), 0);
    drop(h2);
    assert_eq!(*drops.borrow(), 1);
}

#[test]
fn test_chain_of_moves_keeps_single_owner() {
    let drops = Rc::new(RefCell::new(0));
    let mut handles: Vec<OwningHandle<Resource>> = (0..4).map(|_| OwningHandle::empty()).collect();
    handles[0] = OwningHandle::new(Resource {
        drops: Rc::clone(&drops),
    });

    for i in 1..handles.len() {
        let moved = handles[i - 1].take();
        handles[i].assign(moved).unwrap();
        let owners = handles.iter().filter(|h| h.is_owning()).count();
        assert_eq!(owners, 1, "exactly one handle may own the resource");
    }

    assert!(handles[3].is_owning());
    assert_eq!(*drops.borrow(), 0);
    drop(handles);
    assert_eq!(*drops.borrow(), 1);
}

#[test]
fn test_assign_releases_previous_resource() {
    let ledger = Ledger::default();
    let mut target = ledger.handle(1);
    target.assign(ledger.handle(2)).unwrap();

    assert_eq!(ledger.released(), [1], "previous resource released once");
    assert_eq!(target.get(), Some(&2));
    drop(target);
    assert_eq!(ledger.released(), [1, 2]);
}

#[test]
#[allow(clippy::self_assignment)]
fn test_self_move_assignment_is_noop() {
    let ledger = Ledger::default();
    let mut handle = ledger.handle(8);
    handle = handle;
    assert_eq!(handle.get(), Some(&8), "self-move should keep the resource");
    assert!(ledger.released().is_empty(), "self-move must not release");
    drop(handle);
    assert_eq!(ledger.released(), [8]);
}

#[test]
fn test_reset_replaces_resource() {
    let ledger = Ledger::default();
    let mut handle = ledger.handle(1);
    handle.reset_with(2).unwrap();
    assert_eq!(ledger.released(), [1], "old resource released before new one is visible");
    assert_eq!(handle.get(), Some(&2));

    handle.reset().unwrap();
    handle.reset().unwrap();
    assert!(handle.is_empty());
    assert_eq!(ledger.released(), [1, 2], "repeated reset releases once");
}

#[test]
fn test_release_hands_over_ownership() {
    let ledger = Ledger::default();
    let mut handle = ledger.handle(3);
    let raw = handle.release().expect("handle was owning");
    assert!(handle.is_empty());
    drop(handle);
    assert!(ledger.released().is_empty(), "release must not run the policy");

    // The caller is now the owner and releases manually.
    let mut manual = ledger.clone();
    manual.release(raw).unwrap();
    assert_eq!(ledger.released(), [3], "only the manual release happened");
}

#[test]
fn test_release_then_rebox() {
    let mut handle = OwningHandle::new(String::from("owned"));
    let raw = handle.release().unwrap();
    let boxed = raw.into_box();
    assert_eq!(*boxed, "owned");
    assert!(handle.as_ptr().is_null());
}

#[test]
fn test_swap_exchanges_without_release() {
    let ledger = Ledger::default();
    let mut a = ledger.handle(1);
    let mut b = OwningHandle::<u32, _>::empty_with(ledger.clone());
    a.swap(&mut b);

    assert!(a.is_empty());
    assert_eq!(b.get(), Some(&1));
    assert!(ledger.released().is_empty(), "swap must not release");
}

#[test]
fn test_array_handle() {
    let mut squares = OwningHandle::new_array(5, |i| i * i);
    assert_eq!(squares.len(), 5);
    squares[4] = 100;
    assert_eq!(&*squares, &[0, 1, 4, 9, 100]);

    let boxed: Box<[usize]> = squares.into_box().unwrap();
    assert_eq!(boxed.len(), 5);
}

#[test]
fn test_array_handle_drops_every_element() {
    let drops = Rc::new(RefCell::new(0));
    let handle: OwningHandle<[Resource], DeleteArray> = OwningHandle::new_array(3, |_| Resource {
        drops: Rc::clone(&drops),
    });
    drop(handle);
    assert_eq!(*drops.borrow(), 3);
}

#[test]
fn test_try_new_array_reports_overflow() {
    let err = OwningHandle::<[u32], DeleteArray>::try_new_array(usize::MAX / 2, |_| 0).unwrap_err();
    assert!(err.is_allocation_failure(), "expected allocation failure, got {err}");
}

#[test]
fn test_from_raw_null_is_empty() {
    let handle: OwningHandle<u8, Delete> = unsafe { OwningHandle::from_raw(std::ptr::null_mut()) };
    assert!(handle.is_empty());
}

#[test]
fn test_from_raw_takes_ownership() {
    let drops = Rc::new(RefCell::new(0));
    let raw = Box::into_raw(Box::new(Resource {
        drops: Rc::clone(&drops),
    }));
    let handle = unsafe { OwningHandle::from_raw(raw) };
    assert_eq!(handle.as_ptr(), raw);
    drop(handle);
    assert_eq!(*drops.borrow(), 1);
}

#[test]
fn test_close_surfaces_release_error() {
    let handle: OwningHandle<u32, _> =
        OwningHandle::with_policy(4, ReleaseFn::new(|_: u32| Err(Error::Release("still in use".into()))));
    let err = handle.close().unwrap_err();
    assert!(err.is_release_failure());
    assert_eq!(err.to_string(), "release failed: still in use");
}

#[test]
fn test_drop_with_failing_policy_does_not_panic() {
    let attempts = Rc::new(RefCell::new(0));
    let seen = Rc::clone(&attempts);
    let handle: OwningHandle<u32, _> = OwningHandle::with_policy(
        4,
        ReleaseFn::new(move |_: u32| {
            *seen.borrow_mut() += 1;
            Err(Error::Release("still in use".into()))
        }),
    )
    .on_drop_failure(DropFailure::Log);
    drop(handle);
    assert_eq!(*attempts.borrow(), 1, "policy should run exactly once");
}
