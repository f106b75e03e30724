//! Owning raw pointer used as the raw value of memory policies.

use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// A non-null pointer whose possessor owns the referent.
///
/// This is what [`Delete`](crate::Delete) and
/// [`DeleteArray`](crate::DeleteArray) handles store, and what
/// [`OwningHandle::release`](crate::OwningHandle::release) gives back. It is
/// deliberately not `Clone`: there is exactly one `Unique` per allocation.
/// Dropping a `Unique` leaks the allocation; call [`Unique::into_box`] to
/// free it.
///
/// Unlike `NonNull<T>`, `Unique<T>` is `Send`/`Sync` when `T` is, because the
/// referent is unaliased.
#[repr(transparent)]
pub struct Unique<T: ?Sized> {
    pointer: NonNull<T>,
    _marker: PhantomData<T>,
}

unsafe impl<T: Send + ?Sized> Send for Unique<T> {}
unsafe impl<T: Sync + ?Sized> Sync for Unique<T> {}

impl<T: ?Sized> Unique<T> {
    /// Take ownership of a boxed value.
    pub fn from_box(value: Box<T>) -> Self {
        Self {
            pointer: NonNull::from(Box::leak(value)),
            _marker: PhantomData,
        }
    }

    /// Wrap a pointer without checking where it came from.
    ///
    /// # Safety
    ///
    /// `pointer` must come from `Box::<T>::into_raw` (or an equivalent
    /// global allocation with `T`'s layout) and must not be owned elsewhere.
    pub unsafe fn from_non_null(pointer: NonNull<T>) -> Self {
        Self {
            pointer,
            _marker: PhantomData,
        }
    }

    /// Hand the allocation back to `Box`.
    pub fn into_box(self) -> Box<T> {
        // SAFETY: every constructor requires a Box-compatible allocation.
        unsafe { Box::from_raw(self.pointer.as_ptr()) }
    }

    /// Give up ownership and return the bare pointer.
    pub fn into_non_null(self) -> NonNull<T> {
        self.pointer
    }

    /// The pointer, without giving up ownership.
    pub fn as_non_null(&self) -> NonNull<T> {
        self.pointer
    }

    /// The pointer as `*mut T`.
    pub fn as_ptr(&self) -> *mut T {
        self.pointer.as_ptr()
    }
}

impl<T: ?Sized> fmt::Debug for Unique<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.pointer, f)
    }
}

impl<T: ?Sized> PartialEq for Unique<T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(self.pointer.as_ptr(), other.pointer.as_ptr())
    }
}

impl<T: ?Sized> Eq for Unique<T> {}
