//! The archive engine.
//!
//! An [`Archive`] owns the directory model of one ZIP archive, the change
//! log of its uncommitted mutations and the byte store it was loaded from.
//! Queries see pending changes at once; nothing reaches the store until
//! [`Archive::commit`], which writes a complete new archive next to the
//! target and swaps it in.
//!
//! # Example
//!
//! ```rust,no_run
//! use zipwright::{AddOptions, Archive, BufferSource, OpenMode};
//!
//! let mut archive = Archive::open("docs.zip", OpenMode::CreateIfMissing)?;
//! archive.add("README", BufferSource::new("read me"), AddOptions::default())?;
//! let index = archive.find("README")?;
//! archive.set_entry_comment(index, "start here")?;
//! archive.close()?;
//! # Ok::<(), zipwright::Error>(())
//! ```
//!
//! # Lifetime
//!
//! [`close`](Archive::close) commits and consumes the archive,
//! [`discard`](Archive::discard) drops every pending change. Dropping a
//! file-backed archive with pending changes commits them on a best-effort
//! basis; failures are logged with `log::warn!` because `Drop` cannot
//! return them. In-memory archives are never committed implicitly.

mod commit;
mod mutate;
mod open;
mod query;

use std::path::PathBuf;

use crate::crypto::Password;
use crate::directory::Directory;
use crate::edit::ChangeLog;
use crate::store::Store;

/// How [`Archive::open`] treats the target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Read an existing archive; every mutation fails with
    /// [`Error::ReadOnly`](crate::Error::ReadOnly).
    #[default]
    ReadOnly,
    /// Start empty, ignoring any existing file. The file is only replaced
    /// (or removed) on commit.
    CreateOrTruncate,
    /// Read the archive if it exists, otherwise start empty.
    CreateIfMissing,
    /// Read an existing archive for modification.
    ReadWrite,
}

impl OpenMode {
    /// Returns `true` if archives opened in this mode accept mutations.
    pub fn is_writable(self) -> bool {
        self != OpenMode::ReadOnly
    }
}

/// Archive-wide flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFlag {
    /// Reject every mutation.
    ReadOnly,
    /// Commit an empty archive as a bare trailing record instead of
    /// removing the file.
    KeepEmpty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Flags {
    read_only: bool,
    keep_empty: bool,
}

impl Flags {
    fn get(&self, flag: ArchiveFlag) -> bool {
        match flag {
            ArchiveFlag::ReadOnly => self.read_only,
            ArchiveFlag::KeepEmpty => self.keep_empty,
        }
    }

    fn set(&mut self, flag: ArchiveFlag, value: bool) {
        match flag {
            ArchiveFlag::ReadOnly => self.read_only = value,
            ArchiveFlag::KeepEmpty => self.keep_empty = value,
        }
    }
}

/// A ZIP archive open for reading and deferred modification.
pub struct Archive {
    /// Target file; `None` for in-memory archives.
    path: Option<PathBuf>,
    mode: OpenMode,
    store: Store,
    /// Whether the target currently holds a committed archive.
    persisted: bool,
    /// Set by [`OpenMode::CreateOrTruncate`] over an existing file.
    truncated: bool,
    directory: Directory,
    changes: ChangeLog,
    comment: Vec<u8>,
    original_comment: Vec<u8>,
    flags: Flags,
    original_flags: Flags,
    default_password: Option<Password>,
    /// Set once the archive was closed or discarded.
    finished: bool,
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("entries", &self.directory.len())
            .field("pending_changes", &self.changes.len())
            .field("flags", &self.flags)
            .finish()
    }
}

impl Drop for Archive {
    fn drop(&mut self) {
        if self.finished || self.path.is_none() || !self.has_changes() {
            return;
        }
        if let Err(e) = self.commit() {
            log::warn!(
                "failed to commit {:?} on drop, pending changes lost: {}",
                self.path,
                e
            );
        }
    }
}
