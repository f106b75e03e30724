//! Type-erased ownership for opaque implementation types.
//!
//! An [`ErasedHandle`] owns an [`ErasedBox`]: a pointer to [`Opaque`], a type
//! with no visible layout, together with the drop (and optional deep-copy)
//! operations for the real value. Those operations are captured when the box
//! is built from a `Box<T>`, at the point where `T` is known, and travel with
//! the pointer. Nothing can pair the pointer with another type's operations,
//! so a context that only sees the handle still releases the value correctly.

use std::any::{self, TypeId};
use std::fmt;
use std::marker::{PhantomData, PhantomPinned};
use std::ptr::NonNull;

use crate::error::{Error, Result};
use crate::handle::OwningHandle;
use crate::policy::{Delete, Release};
use crate::ptr::Unique;

/// Stand-in for a type whose definition is not visible.
///
/// It cannot be constructed, sized, moved out of, or sent across threads.
#[repr(C)]
pub struct Opaque {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

#[derive(Clone, Copy)]
struct VTable {
    drop: unsafe fn(NonNull<Opaque>),
    duplicate: Option<unsafe fn(NonNull<Opaque>) -> NonNull<Opaque>>,
    type_id: TypeId,
    type_name: &'static str,
}

unsafe fn drop_as<T>(pointer: NonNull<Opaque>) {
    drop(Unique::from_non_null(pointer.cast::<T>()).into_box());
}

unsafe fn duplicate_as<T: Clone>(pointer: NonNull<Opaque>) -> NonNull<Opaque> {
    let value = pointer.cast::<T>().as_ref();
    Unique::from_box(Box::new(value.clone()))
        .into_non_null()
        .cast()
}

impl VTable {
    fn of<T: 'static>() -> Self {
        Self {
            drop: drop_as::<T>,
            duplicate: None,
            type_id: TypeId::of::<T>(),
            type_name: any::type_name::<T>(),
        }
    }

    fn cloneable<T: Clone + 'static>() -> Self {
        Self {
            duplicate: Some(duplicate_as::<T>),
            ..Self::of::<T>()
        }
    }
}

/// A boxed value of a hidden type, carrying its own drop and copy operations.
///
/// It can only be built from a `Box<T>`, so its pointer and operations always
/// agree. Dropping an `ErasedBox` drops the hidden value.
pub struct ErasedBox {
    pointer: NonNull<Opaque>,
    vtable: VTable,
}

impl ErasedBox {
    /// Hide the type of a boxed value.
    pub fn new<T: 'static>(value: Box<T>) -> Self {
        Self::with_vtable(value, VTable::of::<T>())
    }

    /// Hide the type of a boxed value, keeping the ability to deep-copy it.
    pub fn cloneable<T: Clone + 'static>(value: Box<T>) -> Self {
        Self::with_vtable(value, VTable::cloneable::<T>())
    }

    fn with_vtable<T: 'static>(value: Box<T>, vtable: VTable) -> Self {
        Self {
            pointer: Unique::from_box(value).into_non_null().cast(),
            vtable,
        }
    }

    /// Name of the hidden type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.vtable.type_name
    }

    /// Whether the hidden type supports deep copy.
    pub fn is_cloneable(&self) -> bool {
        self.vtable.duplicate.is_some()
    }

    /// Whether the hidden type is `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.vtable.type_id == TypeId::of::<T>()
    }

    /// Borrow the hidden value if it is a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        // SAFETY: the type check matches the type the box was built from.
        self.is::<T>()
            .then(|| unsafe { self.pointer.cast::<T>().as_ref() })
    }

    /// Mutably borrow the hidden value if it is a `T`.
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        // SAFETY: as above, with `&mut self` guaranteeing exclusivity.
        self.is::<T>()
            .then(|| unsafe { self.pointer.cast::<T>().as_mut() })
    }

    /// Recover the original box if the hidden value is a `T`.
    pub fn downcast<T: 'static>(self) -> std::result::Result<Box<T>, Self> {
        if !self.is::<T>() {
            return Err(self);
        }
        let pointer = self.pointer.cast::<T>();
        std::mem::forget(self);
        // SAFETY: the pointer came from a Box<T> and ownership moves back.
        Ok(unsafe { Unique::from_non_null(pointer) }.into_box())
    }

    /// Deep-copy the hidden value into a distinct allocation.
    pub fn try_clone(&self) -> Result<Self> {
        let duplicate = self.vtable.duplicate.ok_or_else(|| {
            Error::InvalidArgument(format!(
                "{} does not support deep copy",
                self.vtable.type_name
            ))
        })?;
        Ok(Self {
            // SAFETY: duplicate was captured together with drop for the type
            // the pointer was built from.
            pointer: unsafe { duplicate(self.pointer) },
            vtable: self.vtable,
        })
    }
}

impl Drop for ErasedBox {
    fn drop(&mut self) {
        // SAFETY: the pointer and vtable were created together from one
        // Box<T>, and this is the only owner.
        unsafe { (self.vtable.drop)(self.pointer) }
    }
}

impl fmt::Debug for ErasedBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedBox")
            .field("pointer", &self.pointer)
            .field("type_name", &self.vtable.type_name)
            .field("cloneable", &self.is_cloneable())
            .finish()
    }
}

impl PartialEq for ErasedBox {
    fn eq(&self, other: &Self) -> bool {
        self.pointer == other.pointer
    }
}

/// Release policy for [`ErasedBox`] values.
///
/// Stateless: the release operation lives in the raw value itself, so
/// replacing the policy cannot change how the hidden value is released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Erased;

impl Release<Opaque> for Erased {
    type Raw = ErasedBox;

    fn release(&mut self, raw: ErasedBox) -> Result<()> {
        tracing::trace!(hidden = raw.type_name(), "dropping erased value");
        drop(raw);
        Ok(())
    }
}

/// A handle owning a value of a type that callers cannot see.
///
/// Released raw values stay typed by their own drop operation, so they
/// cannot be rebound as a bare `Opaque` pointer:
///
/// ```compile_fail
/// use unique::{Delete, ErasedHandle, Opaque, OwningHandle};
///
/// let mut erased = ErasedHandle::erase(String::from("hidden"));
/// let raw = erased.release().unwrap();
/// let rebound: OwningHandle<Opaque, Delete> = OwningHandle::with_policy(raw, Delete);
/// ```
///
/// and an erased handle only accepts raw values built from a `Box<T>`:
///
/// ```compile_fail
/// use unique::{Erased, ErasedHandle, Unique};
///
/// let forged = ErasedHandle::with_policy(Unique::from_box(Box::new(7_u8)), Erased);
/// ```
pub type ErasedHandle = OwningHandle<Opaque, Erased>;

impl OwningHandle<Opaque, Erased> {
    /// Allocate `value` and hide its type.
    pub fn erase<T: 'static>(value: T) -> Self {
        Self::with_policy(ErasedBox::new(Box::new(value)), Erased)
    }

    /// Allocate `value`, hide its type and keep the ability to deep-copy it.
    pub fn erase_cloneable<T: Clone + 'static>(value: T) -> Self {
        Self::with_policy(ErasedBox::cloneable(Box::new(value)), Erased)
    }

    /// Like [`erase`](Self::erase), reporting allocation failure.
    pub fn try_erase<T: 'static>(value: T) -> Result<Self> {
        Ok(OwningHandle::try_new(value)?.into_erased())
    }

    /// Like [`erase_cloneable`](Self::erase_cloneable), reporting allocation
    /// failure.
    pub fn try_erase_cloneable<T: Clone + 'static>(value: T) -> Result<Self> {
        let mut typed = OwningHandle::try_new(value)?;
        let on_drop_failure = typed.drop_failure_mode();
        let erased = match typed.release() {
            Some(raw) => Self::with_policy(ErasedBox::cloneable(raw.into_box()), Erased),
            None => Self::empty(),
        };
        Ok(erased.on_drop_failure(on_drop_failure))
    }

    /// Borrow the hidden value if it is a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.get()?.downcast_ref()
    }

    /// Mutably borrow the hidden value if it is a `T`.
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.get_mut()?.downcast_mut()
    }

    /// Deep-copy the hidden value into a new handle.
    ///
    /// The copy owns a distinct allocation. An empty handle copies to an
    /// empty handle. Fails if the hidden type was not erased as cloneable.
    pub fn try_clone(&self) -> Result<Self> {
        let copy = match self.get() {
            Some(raw) => Self::with_policy(raw.try_clone()?, Erased),
            None => Self::empty(),
        };
        Ok(copy.on_drop_failure(self.drop_failure_mode()))
    }
}

impl<T: 'static> OwningHandle<T, Delete> {
    /// Hide the owned value's type behind [`Opaque`].
    pub fn into_erased(mut self) -> ErasedHandle {
        let on_drop_failure = self.drop_failure_mode();
        let erased = match self.release() {
            Some(raw) => ErasedHandle::with_policy(ErasedBox::new(raw.into_box()), Erased),
            None => ErasedHandle::empty(),
        };
        erased.on_drop_failure(on_drop_failure)
    }
}
