//! The exclusively-owning handle.

use std::alloc::{self, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use crate::error::{Error, Result};
use crate::policy::{BoxRelease, Delete, DeleteArray, Release};
use crate::ptr::Unique;
use crate::types::DropFailure;

/// A move-only handle owning at most one resource.
///
/// The resource is given back through the release policy `P` exactly once:
/// on [`reset`](Self::reset), on [`close`](Self::close), or when the handle is
/// dropped. [`release`](Self::release) hands the resource to the caller
/// without running the policy.
///
/// # Example
///
/// ```
/// use unique::OwningHandle;
///
/// let mut greeting = OwningHandle::new(String::from("hello"));
/// greeting.push_str(", world");
/// assert_eq!(greeting.value().map(String::as_str), Some("hello, world"));
///
/// let moved = greeting.take();
/// assert!(greeting.is_empty());
/// assert!(moved.is_owning());
/// ```
///
/// The handle cannot be duplicated:
///
/// ```compile_fail
/// use unique::OwningHandle;
///
/// let a = OwningHandle::new(1_u8);
/// let b: OwningHandle<u8> = a.clone();
/// ```
///
/// and array allocations only pair with the array policy:
///
/// ```compile_fail
/// use unique::{Delete, OwningHandle};
///
/// let items: Box<[u8]> = vec![1, 2, 3].into_boxed_slice();
/// let h: OwningHandle<[u8], Delete> = OwningHandle::from_box(items);
/// ```
///
/// ```compile_fail
/// use unique::{DeleteArray, OwningHandle};
///
/// let h: OwningHandle<[u8], DeleteArray> = OwningHandle::from_box(Box::new(1_u8));
/// ```
pub struct OwningHandle<T: ?Sized, P: Release<T> = Delete> {
    raw: Option<P::Raw>,
    policy: P,
    on_drop_failure: DropFailure,
    _owns: PhantomData<T>,
}

impl<T: ?Sized, P: Release<T>> OwningHandle<T, P> {
    /// Create an empty handle with a default-constructed policy.
    pub fn empty() -> Self
    where
        P: Default,
    {
        Self::empty_with(P::default())
    }

    /// Create an empty handle carrying `policy`.
    pub fn empty_with(policy: P) -> Self {
        Self {
            raw: None,
            policy,
            on_drop_failure: DropFailure::default(),
            _owns: PhantomData,
        }
    }

    /// Bind `raw` with an explicit policy.
    ///
    /// If `raw` is the policy's null value the handle is empty.
    pub fn with_policy(raw: P::Raw, policy: P) -> Self {
        let raw = if policy.is_null(&raw) { None } else { Some(raw) };
        if raw.is_some() {
            tracing::trace!(resource = std::any::type_name::<T>(), "bound resource");
        }
        Self {
            raw,
            policy,
            on_drop_failure: DropFailure::default(),
            _owns: PhantomData,
        }
    }

    /// Choose what an implicit release does if the policy fails.
    pub fn on_drop_failure(mut self, mode: DropFailure) -> Self {
        self.on_drop_failure = mode;
        self
    }

    /// The configured drop failure mode.
    pub fn drop_failure_mode(&self) -> DropFailure {
        self.on_drop_failure
    }

    /// The owned raw value, without transferring ownership.
    ///
    /// Returns `None` if the handle is empty. The reference is only valid for
    /// as long as the handle keeps owning the resource.
    pub fn get(&self) -> Option<&P::Raw> {
        self.raw.as_ref()
    }

    pub(crate) fn get_mut(&mut self) -> Option<&mut P::Raw> {
        self.raw.as_mut()
    }

    /// Whether the handle currently owns nothing.
    pub fn is_empty(&self) -> bool {
        self.raw.is_none()
    }

    /// Whether the handle currently owns a resource.
    pub fn is_owning(&self) -> bool {
        self.raw.is_some()
    }

    /// The release policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// The release policy, mutably.
    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    /// Give up ownership without running the release policy.
    ///
    /// The handle becomes empty; the caller is now responsible for the
    /// returned resource.
    #[must_use = "the released resource is no longer managed and will leak if ignored"]
    pub fn release(&mut self) -> Option<P::Raw> {
        let raw = self.raw.take();
        if raw.is_some() {
            tracing::trace!(
                resource = std::any::type_name::<T>(),
                "relinquished resource"
            );
        }
        raw
    }

    /// Release the owned resource, if any, and become empty.
    ///
    /// Calling this on an empty handle does nothing. The handle is empty
    /// afterwards even if the policy reported a failure.
    pub fn reset(&mut self) -> Result<()> {
        match self.raw.take() {
            Some(raw) => self.release_raw(raw),
            None => Ok(()),
        }
    }

    /// Release the owned resource, if any, then bind `raw`.
    ///
    /// The new resource is bound even if releasing the previous one failed;
    /// that failure is returned.
    pub fn reset_with(&mut self, raw: P::Raw) -> Result<()> {
        let result = self.reset();
        if !self.policy.is_null(&raw) {
            self.raw = Some(raw);
        }
        result
    }

    /// Move-assign: release the current resource, then take over `other`.
    ///
    /// `other`'s raw value, policy and drop mode replace this handle's. The
    /// previous resource is released through the previous policy.
    pub fn assign(&mut self, other: Self) -> Result<()> {
        let previous = mem::replace(self, other);
        previous.close()
    }

    /// Move the contents out, leaving an empty handle with a default policy.
    pub fn take(&mut self) -> Self
    where
        P: Default,
    {
        let mut moved = Self::empty();
        self.swap(&mut moved);
        moved
    }

    /// Exchange raw values and policies with `other`. Nothing is released.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Release the owned resource, reporting the policy's result.
    ///
    /// This is called automatically on drop, but can be called explicitly
    /// to handle any errors that may occur during release.
    pub fn close(mut self) -> Result<()> {
        self.reset()
    }

    fn release_raw(&mut self, raw: P::Raw) -> Result<()> {
        tracing::trace!(resource = std::any::type_name::<T>(), "releasing resource");
        self.policy.release(raw)
    }
}

impl<T> OwningHandle<T, Delete> {
    /// Allocate `value` and own it.
    pub fn new(value: T) -> Self {
        Self::from_box(Box::new(value))
    }

    /// Allocate `value`, reporting allocation failure instead of aborting.
    ///
    /// On failure `value` is dropped and no handle exists.
    pub fn try_new(value: T) -> Result<Self> {
        let layout = Layout::new::<T>();
        let pointer = if layout.size() == 0 {
            NonNull::<T>::dangling()
        } else {
            // SAFETY: the layout has a non-zero size.
            let raw = unsafe { alloc::alloc(layout) }.cast::<T>();
            NonNull::new(raw).ok_or(Error::AllocationFailed {
                size: layout.size(),
                align: layout.align(),
            })?
        };

        // SAFETY: the pointer is fresh, aligned and sized for T, and was
        // obtained from the global allocator with T's layout, which is what
        // Box uses.
        unsafe {
            pointer.as_ptr().write(value);
            Ok(Self::with_policy(Unique::from_non_null(pointer), Delete))
        }
    }

    /// Take ownership of a boxed value.
    pub fn from_box(value: Box<T>) -> Self {
        Self::with_policy(Unique::from_box(value), Delete)
    }

    /// Take ownership of a raw pointer. A null pointer gives an empty handle.
    ///
    /// # Safety
    ///
    /// A non-null `pointer` must come from `Box::<T>::into_raw` and must not be
    /// owned by anything else.
    pub unsafe fn from_raw(pointer: *mut T) -> Self {
        match NonNull::new(pointer) {
            Some(pointer) => Self::with_policy(Unique::from_non_null(pointer), Delete),
            None => Self::empty(),
        }
    }

    /// The owned pointer, or null when empty.
    pub fn as_ptr(&self) -> *mut T {
        self.raw
            .as_ref()
            .map_or(std::ptr::null_mut(), Unique::as_ptr)
    }
}

impl<T> OwningHandle<[T], DeleteArray> {
    /// Allocate an array of `len` elements built by `fill`.
    pub fn new_array(len: usize, fill: impl FnMut(usize) -> T) -> Self {
        Self::from_boxed_slice((0..len).map(fill).collect())
    }

    /// Allocate an array of `len` elements, reporting allocation failure.
    ///
    /// `fill` is not called if the allocation fails.
    pub fn try_new_array(len: usize, fill: impl FnMut(usize) -> T) -> Result<Self> {
        let layout = Layout::array::<T>(len).map_err(|_| Error::CapacityOverflow)?;
        let mut items = Vec::new();
        items
            .try_reserve_exact(len)
            .map_err(|_| Error::AllocationFailed {
                size: layout.size(),
                align: layout.align(),
            })?;
        items.extend((0..len).map(fill));
        Ok(Self::from_boxed_slice(items.into_boxed_slice()))
    }

    /// Take ownership of a boxed slice.
    pub fn from_boxed_slice(items: Box<[T]>) -> Self {
        Self::with_policy(Unique::from_box(items), DeleteArray)
    }

    /// Number of owned elements, 0 when empty.
    pub fn len(&self) -> usize {
        self.raw
            .as_ref()
            .map_or(0, |raw| raw.as_non_null().len())
    }
}

impl<T> From<Vec<T>> for OwningHandle<[T], DeleteArray> {
    fn from(items: Vec<T>) -> Self {
        Self::from_boxed_slice(items.into_boxed_slice())
    }
}

impl<T> From<Box<T>> for OwningHandle<T, Delete> {
    fn from(value: Box<T>) -> Self {
        Self::from_box(value)
    }
}

impl<T: ?Sized, P: BoxRelease<T>> OwningHandle<T, P> {
    /// Borrow the owned value, or `None` when empty.
    pub fn value(&self) -> Option<&T> {
        // SAFETY: BoxRelease raw values point at a live, exclusively owned T.
        self.raw.as_ref().map(|raw| unsafe { raw.as_non_null().as_ref() })
    }

    /// Mutably borrow the owned value, or `None` when empty.
    pub fn value_mut(&mut self) -> Option<&mut T> {
        // SAFETY: as above, and `&mut self` guarantees exclusive access.
        self.raw
            .as_mut()
            .map(|raw| unsafe { raw.as_non_null().as_mut() })
    }

    /// Hand the owned value back to `Box`, leaving nothing to release.
    pub fn into_box(mut self) -> Option<Box<T>> {
        self.raw.take().map(Unique::into_box)
    }
}

impl<T: ?Sized, P: BoxRelease<T>> Deref for OwningHandle<T, P> {
    type Target = T;

    /// # Panics
    ///
    /// Panics if the handle is empty.
    fn deref(&self) -> &T {
        match self.value() {
            Some(value) => value,
            None => panic!("dereferenced an empty OwningHandle"),
        }
    }
}

impl<T: ?Sized, P: BoxRelease<T>> DerefMut for OwningHandle<T, P> {
    fn deref_mut(&mut self) -> &mut T {
        match self.value_mut() {
            Some(value) => value,
            None => panic!("dereferenced an empty OwningHandle"),
        }
    }
}

impl<T: ?Sized, P: Release<T> + Default> Default for OwningHandle<T, P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized, P: Release<T>> Drop for OwningHandle<T, P> {
    fn drop(&mut self) {
        if let Err(err) = self.reset() {
            self.on_drop_failure.handle(&err);
        }
    }
}

impl<T: ?Sized, P> fmt::Debug for OwningHandle<T, P>
where
    P: Release<T> + fmt::Debug,
    P::Raw: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwningHandle")
            .field("raw", &self.raw)
            .field("policy", &self.policy)
            .field("on_drop_failure", &self.on_drop_failure)
            .finish()
    }
}
