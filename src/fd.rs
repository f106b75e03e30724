//! Owning handles for raw file descriptors.

use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};

use crate::error::Result;
use crate::handle::OwningHandle;
use crate::policy::Release;

/// Release policy that closes a file descriptor with `close(2)`.
///
/// The raw value is an [`OwnedFd`], so a handle can only be bound to a
/// descriptor that something already owned. Binding a bare `RawFd` goes
/// through the `unsafe` [`FdHandle::from_raw_fd`]:
///
/// ```compile_fail
/// use std::os::fd::AsRawFd;
/// use unique::{CloseFd, FdHandle};
///
/// let file = std::fs::File::open("/dev/null").unwrap();
/// let stolen = FdHandle::with_policy(file.as_raw_fd(), CloseFd);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloseFd;

impl Release<RawFd> for CloseFd {
    type Raw = OwnedFd;

    fn release(&mut self, fd: OwnedFd) -> Result<()> {
        let fd = fd.into_raw_fd();
        // SAFETY: fd came out of an OwnedFd, so it is open and ours to close.
        if unsafe { libc::close(fd) } == -1 {
            let err = io::Error::last_os_error();
            tracing::warn!(fd, error = %err, "close failed");
            return Err(err.into());
        }
        Ok(())
    }
}

/// A handle owning a file descriptor.
pub type FdHandle = OwningHandle<RawFd, CloseFd>;

impl OwningHandle<RawFd, CloseFd> {
    /// Take ownership of `fd`. A negative value gives an empty handle.
    ///
    /// # Safety
    ///
    /// A non-negative `fd` must be open and not owned by anything else.
    pub unsafe fn from_raw_fd(fd: RawFd) -> Self {
        if fd < 0 {
            return Self::empty();
        }
        Self::with_policy(OwnedFd::from_raw_fd(fd), CloseFd)
    }

    /// Take ownership of the descriptor behind `file`.
    pub fn from_file(file: File) -> Self {
        Self::with_policy(OwnedFd::from(file), CloseFd)
    }

    /// The owned descriptor, or `-1` when empty.
    pub fn as_raw_fd(&self) -> RawFd {
        self.get().map_or(-1, AsRawFd::as_raw_fd)
    }

    /// Hand the descriptor back to std as a `File`.
    pub fn into_file(mut self) -> Option<File> {
        self.release().map(File::from)
    }

    /// Run `f` against the descriptor viewed as a `File` without giving up
    /// ownership.
    pub fn with_file<R>(&self, f: impl FnOnce(&File) -> R) -> Option<R> {
        let fd = self.get()?.as_raw_fd();
        // SAFETY: the descriptor stays owned by the handle; ManuallyDrop keeps
        // the borrowed File from closing it.
        let file = std::mem::ManuallyDrop::new(unsafe { File::from_raw_fd(fd) });
        Some(f(&file))
    }
}

impl From<OwnedFd> for OwningHandle<RawFd, CloseFd> {
    fn from(fd: OwnedFd) -> Self {
        Self::with_policy(fd, CloseFd)
    }
}

impl From<File> for OwningHandle<RawFd, CloseFd> {
    fn from(file: File) -> Self {
        Self::from_file(file)
    }
}

impl AsRawFd for OwningHandle<RawFd, CloseFd> {
    fn as_raw_fd(&self) -> RawFd {
        FdHandle::as_raw_fd(self)
    }
}
