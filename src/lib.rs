//! Exclusively-owning resource handles and opaque-implementation wrappers.
//!
//! [`OwningHandle`] owns at most one resource and gives it back exactly once
//! through a release policy: [`Delete`] for boxed values, [`DeleteArray`] for
//! boxed slices, [`ReleaseFn`] for arbitrary callbacks, `CloseFd` for file
//! descriptors on unix, and [`Erased`] for values whose type is hidden behind
//! [`Opaque`].
//!
//! [`Widget`] and `Journal` show the opaque-implementation pattern built on
//! top: their only state is a handle to a private implementation type.
//!
//! # Example
//!
//! ```
//! use unique::{OwningHandle, ReleaseFn};
//!
//! fn main() -> unique::Result<()> {
//!     // A boxed value, released on drop.
//!     let mut counter = OwningHandle::new(0_u32);
//!     *counter += 1;
//!
//!     // An array, released with the array policy.
//!     let squares = OwningHandle::new_array(4, |i| i * i);
//!     assert_eq!(&*squares, &[0, 1, 4, 9]);
//!
//!     // A non-memory resource with a custom release callback.
//!     let lock: OwningHandle<u64, _> = OwningHandle::with_policy(
//!         42,
//!         ReleaseFn::new(|token: u64| {
//!             println!("unlocking {token}");
//!             Ok(())
//!         }),
//!     );
//!
//!     // Explicit close surfaces release errors that drop would only log.
//!     lock.close()?;
//!     Ok(())
//! }
//! ```

pub mod erased;
pub mod error;
#[cfg(unix)]
pub mod fd;
pub mod handle;
#[cfg(unix)]
pub mod journal;
pub mod policy;
pub mod ptr;
pub mod types;
pub mod widget;

// Re-export main types at the crate root
pub use erased::{Erased, ErasedBox, ErasedHandle, Opaque};
pub use error::{Error, Result};
#[cfg(unix)]
pub use fd::{CloseFd, FdHandle};
pub use handle::OwningHandle;
#[cfg(unix)]
pub use journal::Journal;
pub use policy::{BoxRelease, Delete, DeleteArray, Release, ReleaseFn};
pub use ptr::Unique;
pub use types::DropFailure;
pub use widget::{TeardownHook, Widget, WidgetOptions};
