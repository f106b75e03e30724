//! Type-erased handle tests.

use std::cell::Cell;
use std::rc::Rc;

use unique::{Erased, ErasedBox, ErasedHandle, OwningHandle};

/// Counts how many times it is dropped.
struct Counted(Rc<Cell<u32>>);

impl Drop for Counted {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn test_replacing_policy_keeps_hidden_type() {
    let mut handle = ErasedHandle::erase(7_u8);
    *handle.policy_mut() = Erased;

    assert!(
        handle.downcast_ref::<Vec<u64>>().is_none(),
        "policy must not decide the hidden type"
    );
    assert_eq!(handle.downcast_ref::<u8>(), Some(&7));
}

#[test]
fn test_rebound_raw_drops_real_value_once() {
    let drops = Rc::new(Cell::new(0));
    let mut first = ErasedHandle::erase(Counted(Rc::clone(&drops)));
    let raw = first.release().expect("handle was owning");
    drop(first);

    let second = ErasedHandle::with_policy(raw, Erased);
    assert!(second.downcast_ref::<Counted>().is_some());
    assert_eq!(drops.get(), 0, "rebinding must not drop");

    drop(second);
    assert_eq!(drops.get(), 1, "hidden value should drop exactly once");
}

#[test]
fn test_reset_with_other_type_releases_previous() {
    let drops = Rc::new(Cell::new(0));
    let mut handle = ErasedHandle::erase(Counted(Rc::clone(&drops)));

    handle
        .reset_with(ErasedBox::new(Box::new(String::from("next"))))
        .unwrap();
    assert_eq!(drops.get(), 1, "previous value released through its own drop");
    assert_eq!(handle.downcast_ref::<String>().unwrap(), "next");
    assert!(handle.downcast_ref::<Counted>().is_none());
}

#[test]
fn test_into_erased_keeps_drop_failure_mode() {
    let typed = OwningHandle::new(vec![1_u32, 2]).on_drop_failure(unique::DropFailure::Ignore);
    let erased = typed.into_erased();
    assert_eq!(erased.drop_failure_mode(), unique::DropFailure::Ignore);
    assert_eq!(erased.downcast_ref::<Vec<u32>>().unwrap(), &[1, 2]);
}

#[test]
fn test_try_clone_of_empty_is_empty() {
    let handle = ErasedHandle::empty();
    let copy = handle.try_clone().expect("empty copy should succeed");
    assert!(copy.is_empty());
}
