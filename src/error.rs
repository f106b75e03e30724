//! Error types for the unique crate.

use thiserror::Error;

/// Result type alias for handle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for handle operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Raw value is the null value of its release policy.
    #[error("invalid handle")]
    InvalidHandle,

    /// Function argument is invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The allocator could not provide memory for a new resource.
    #[error("allocation of {size} bytes (align {align}) failed")]
    AllocationFailed {
        /// Requested size in bytes.
        size: usize,
        /// Requested alignment in bytes.
        align: usize,
    },

    /// Requested element count does not fit in the address space.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// A release policy reported a failure.
    #[error("release failed: {0}")]
    Release(String),

    /// OS-level I/O error, usually from closing a descriptor.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this is an allocation failure.
    pub fn is_allocation_failure(&self) -> bool {
        matches!(self, Error::AllocationFailed { .. } | Error::CapacityOverflow)
    }

    /// Check if this error came out of a release policy.
    pub fn is_release_failure(&self) -> bool {
        matches!(self, Error::Release(_) | Error::Io(_))
    }

    /// Check if this is an I/O error.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}
