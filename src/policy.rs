//! Release policies.
//!
//! A policy decides how an [`OwningHandle`](crate::OwningHandle) gives its
//! resource back. Each policy names the raw form it accepts, which is what
//! keeps acquisition and release paired: a `Box<T>` can only be bound to a
//! [`Delete`] handle and a `Box<[T]>` only to a [`DeleteArray`] handle.

use std::fmt;
use std::marker::PhantomData;
use crate::error::Result;
use crate::ptr::Unique;

/// Strategy for returning a resource of type `T` to its source.
pub trait Release<T: ?Sized> {
    /// Raw representation of an owned resource.
    type Raw;

    /// Whether `raw` is this policy's null value.
    ///
    /// Binding a null value produces an empty handle.
    fn is_null(&self, _raw: &Self::Raw) -> bool {
        false
    }

    /// Release the resource. Called at most once per resource.
    fn release(&mut self, raw: Self::Raw) -> Result<()>;
}

/// Single-object deallocation, pairs with `Box<T>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delete;

impl<T> Release<T> for Delete {
    type Raw = Unique<T>;

    fn release(&mut self, raw: Unique<T>) -> Result<()> {
        drop(raw.into_box());
        Ok(())
    }
}

/// Array deallocation, pairs with `Box<[T]>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteArray;

impl<T> Release<[T]> for DeleteArray {
    type Raw = Unique<[T]>;

    fn release(&mut self, raw: Unique<[T]>) -> Result<()> {
        drop(raw.into_box());
        Ok(())
    }
}

/// Memory policies whose raw value points at a `T` allocated by `Box`.
///
/// Handles with such a policy can be dereferenced and turned back into a box.
///
/// # Safety
///
/// `release` must free the allocation exactly like dropping the `Box<T>`
/// would, so that the handle may hand the pointer back to `Box` instead.
pub unsafe trait BoxRelease<T: ?Sized>: Release<T, Raw = Unique<T>> {}

unsafe impl<T> BoxRelease<T> for Delete {}
unsafe impl<T> BoxRelease<[T]> for DeleteArray {}

/// Caller-supplied release callback.
///
/// Lets a handle manage a resource that is not memory: a lock token, a
/// connection id, a descriptor from a foreign API.
///
/// ```
/// use unique::{OwningHandle, ReleaseFn};
///
/// let mut closed = Vec::new();
/// {
///     let conn: OwningHandle<u32, _> =
///         OwningHandle::with_policy(7, ReleaseFn::infallible(|id: u32| closed.push(id)));
///     assert_eq!(conn.get(), Some(&7));
/// }
/// assert_eq!(closed, [7]);
/// ```
pub struct ReleaseFn<R, F> {
    f: F,
    null: Option<fn(&R) -> bool>,
    _raw: PhantomData<fn(R)>,
}

impl<R, F> ReleaseFn<R, F>
where
    F: FnMut(R) -> Result<()>,
{
    /// Wrap a fallible release callback.
    pub fn new(f: F) -> Self {
        Self {
            f,
            null: None,
            _raw: PhantomData,
        }
    }
}

impl<R, G> ReleaseFn<R, Infallible<G>>
where
    G: FnMut(R),
{
    /// Wrap a release callback that cannot fail.
    pub fn infallible(f: G) -> Self {
        Self {
            f: Infallible(f),
            null: None,
            _raw: PhantomData,
        }
    }
}

impl<R, F> ReleaseFn<R, F> {
    /// Treat raw values matching `is_null` as "no resource".
    pub fn with_null(mut self, is_null: fn(&R) -> bool) -> Self {
        self.null = Some(is_null);
        self
    }
}

impl<R, F> fmt::Debug for ReleaseFn<R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseFn")
            .field("has_null", &self.null.is_some())
            .finish_non_exhaustive()
    }
}

/// Adapter turning an `FnMut(R)` into an `FnMut(R) -> Result<()>`.
pub struct Infallible<G>(G);

/// Callback invoked by [`ReleaseFn`].
pub trait ReleaseCallback<R> {
    /// Run the callback.
    fn call(&mut self, raw: R) -> Result<()>;
}

impl<R, F> ReleaseCallback<R> for F
where
    F: FnMut(R) -> Result<()>,
{
    fn call(&mut self, raw: R) -> Result<()> {
        self(raw)
    }
}

impl<R, G> ReleaseCallback<R> for Infallible<G>
where
    G: FnMut(R),
{
    fn call(&mut self, raw: R) -> Result<()> {
        (self.0)(raw);
        Ok(())
    }
}

impl<R, F> Release<R> for ReleaseFn<R, F>
where
    F: ReleaseCallback<R>,
{
    type Raw = R;

    fn is_null(&self, raw: &R) -> bool {
        self.null.is_some_and(|is_null| is_null(raw))
    }

    fn release(&mut self, raw: R) -> Result<()> {
        self.f.call(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_delete_runs_destructor() {
        struct Flag<'a>(&'a std::cell::Cell<u32>);
        impl Drop for Flag<'_> {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let drops = std::cell::Cell::new(0);
        let raw = Unique::from_box(Box::new(Flag(&drops)));
        <Delete as Release<Flag<'_>>>::release(&mut Delete, raw).unwrap();
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_delete_array_frees_every_element() {
        let items: Box<[String]> = vec!["a".to_string(), "b".to_string()].into_boxed_slice();
        let raw = Unique::from_box(items);
        <DeleteArray as Release<[String]>>::release(&mut DeleteArray, raw).unwrap();
    }

    #[test]
    fn test_release_fn_propagates_error() {
        let mut policy = ReleaseFn::new(|_: i32| Err(Error::Release("busy".into())));
        let err = policy.release(3).unwrap_err();
        assert!(err.is_release_failure());
    }

    #[test]
    fn test_release_fn_null_predicate() {
        let policy = ReleaseFn::infallible(|_: i32| {}).with_null(|v| *v < 0);
        assert!(policy.is_null(&-1));
        assert!(!policy.is_null(&4));

        let plain = ReleaseFn::infallible(|_: i32| {});
        assert!(!plain.is_null(&-1));
    }
}
