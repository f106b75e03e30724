use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::Journal;
use crate::error::{Error, Result};
use crate::fd::FdHandle;
use crate::handle::OwningHandle;

pub(super) struct JournalImpl {
    path: PathBuf,
    fd: FdHandle,
    entries: usize,
}

impl JournalImpl {
    fn append(&mut self, entry: &str) -> Result<()> {
        if entry.contains('\n') {
            return Err(Error::InvalidArgument(
                "journal entries must be single lines".to_string(),
            ));
        }

        self.fd
            .with_file(|mut file| {
                file.write_all(entry.as_bytes())?;
                file.write_all(b"\n")
            })
            .ok_or(Error::InvalidHandle)??;
        self.entries += 1;
        Ok(())
    }
}

impl Journal {
    /// Open (or create) the journal at `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let imp = JournalImpl {
            path: path.to_path_buf(),
            fd: FdHandle::from_file(file),
            entries: 0,
        };
        tracing::debug!(path = %path.display(), "opened journal");

        Ok(Self {
            inner: OwningHandle::try_new(imp)?,
        })
    }

    /// Append one line.
    pub fn append(&mut self, entry: &str) -> Result<()> {
        self.inner.append(entry)
    }

    /// Flush appended entries to disk.
    pub fn sync(&self) -> Result<()> {
        self.inner
            .fd
            .with_file(|file| file.sync_data())
            .ok_or(Error::InvalidHandle)??;
        Ok(())
    }

    /// Path the journal was opened at.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Number of entries appended through this journal.
    pub fn entries(&self) -> usize {
        self.inner.entries
    }

    /// Close the descriptor, reporting any error from `close(2)`.
    ///
    /// This is called automatically on drop, but can be called explicitly
    /// to handle any errors that may occur during close.
    pub fn close(self) -> Result<()> {
        match self.inner.into_box() {
            Some(imp) => imp.fd.close(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Journal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Journal")
            .field("path", &self.inner.path)
            .field("fd", &self.inner.fd.as_raw_fd())
            .field("entries", &self.inner.entries)
            .finish()
    }
}
