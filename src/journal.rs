//! An append-only journal file with a hidden, move-only implementation.

use crate::handle::OwningHandle;

mod imp;

/// Append-only line journal backed by an owned file descriptor.
///
/// The journal's only state is a handle to a private implementation that
/// owns the descriptor. The implementation is not copyable, so neither is the
/// journal: it can only be moved.
///
/// ```compile_fail
/// fn duplicate(journal: &unique::Journal) -> unique::Journal {
///     journal.clone()
/// }
/// ```
pub struct Journal {
    inner: OwningHandle<imp::JournalImpl>,
}
