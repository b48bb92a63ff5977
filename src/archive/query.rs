//! Lookups, metadata and entry readers.

use std::borrow::Cow;
use std::path::Path;

use super::{Archive, ArchiveFlag, OpenMode};
use crate::crypto::Password;
use crate::format::header::decode_text;
use crate::read::{Entries, EntryMetadata, EntryReader};
use crate::{Error, Result};

impl Archive {
    /// Returns the number of live entries, pending adds included.
    pub fn len(&self) -> usize {
        self.directory.len()
    }

    /// Returns `true` if the archive has no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the archive path, `None` for in-memory archives.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the mode the archive was opened with.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Returns `true` if a commit would write anything.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
            || self.comment != self.original_comment
            || self.truncated
            || (self.flags.keep_empty && !self.persisted)
    }

    /// Returns the index of the live entry with exactly this name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if no live entry has the name.
    pub fn find(&self, name: &str) -> Result<usize> {
        self.directory
            .find(name)
            .ok_or_else(|| Error::EntryNotFound {
                name: name.to_string(),
            })
    }

    /// Returns `true` if a live entry has this name.
    pub fn exists(&self, name: &str) -> bool {
        self.directory.find(name).is_some()
    }

    pub(crate) fn metadata_at(&self, index: usize) -> Option<EntryMetadata> {
        let record = self.directory.get(index)?;
        Some(EntryMetadata::from_record(
            index,
            record,
            self.changes.source_for(index).is_some(),
        ))
    }

    /// Returns a snapshot of the entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIndex`] if the index is not live.
    pub fn stat(&self, index: usize) -> Result<EntryMetadata> {
        self.metadata_at(index)
            .ok_or(Error::InvalidIndex { index })
    }

    /// Returns a snapshot of the entry with this name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if no live entry has the name.
    pub fn stat_name(&self, name: &str) -> Result<EntryMetadata> {
        self.stat(self.find(name)?)
    }

    /// Iterates over the live entries in slot order.
    ///
    /// Existing entries come in central directory order, followed by pending
    /// adds in the order they were added.
    pub fn entries(&self) -> Entries<'_> {
        Entries::new(self, self.directory.live_indices())
    }

    /// Opens the entry at `index` for reading.
    ///
    /// Encrypted entries use `password`, or the default password when
    /// `None`. Entries with pending contents stream their source directly.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidIndex`] if the index is not live
    /// - [`Error::PasswordRequired`] / [`Error::WrongPassword`] for
    ///   encrypted entries
    /// - [`Error::UnsupportedMethod`] for methods other than Stored and Deflate
    /// - [`Error::Io`] if a pending file source cannot be opened
    pub fn open_entry(&self, index: usize, password: Option<&Password>) -> Result<EntryReader<'_>> {
        let record = self.directory.live(index)?;
        if let Some((source, _)) = self.changes.source_for(index) {
            return EntryReader::pending(index, &record.name, source);
        }
        let password = password.or(self.default_password.as_ref());
        EntryReader::committed(&self.store, index, &record.name, &record.header, password)
    }

    /// Opens the entry with this name for reading.
    ///
    /// # Errors
    ///
    /// As for [`open_entry`](Self::open_entry), with
    /// [`Error::EntryNotFound`] for unknown names.
    pub fn open_entry_by_name(
        &self,
        name: &str,
        password: Option<&Password>,
    ) -> Result<EntryReader<'_>> {
        self.open_entry(self.find(name)?, password)
    }

    /// Returns the archive comment, including uncommitted edits.
    pub fn comment(&self) -> Cow<'_, str> {
        decode_text(&self.comment)
    }

    /// Returns the comment of the entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIndex`] if the index is not live.
    pub fn entry_comment(&self, index: usize) -> Result<Cow<'_, str>> {
        Ok(self.directory.live(index)?.comment())
    }

    /// Returns the current value of a flag.
    pub fn flag(&self, flag: ArchiveFlag) -> bool {
        self.flags.get(flag)
    }

    /// Returns the number of recorded, uncommitted entry changes.
    pub fn pending_changes(&self) -> usize {
        self.changes.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::{AddOptions, Archive, BufferSource, ErrorKind};

    fn sample() -> Archive {
        let mut archive = Archive::new_in_memory();
        for name in ["README", "INSTALL"] {
            archive
                .add(name, BufferSource::new(name), AddOptions::default())
                .unwrap();
        }
        archive
    }

    #[test]
    fn test_find_and_exists() {
        let archive = sample();
        assert_eq!(archive.find("INSTALL").unwrap(), 1);
        assert!(archive.exists("README"));
        assert!(!archive.exists("readme"));
        let err = archive.find("missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_stat_pending_entry() {
        let archive = sample();
        let meta = archive.stat(0).unwrap();
        assert_eq!(meta.name, "README");
        assert!(meta.is_pending);
        assert_eq!(meta.size, 6);
        assert_eq!(archive.stat(7).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_read_pending_entry() {
        let archive = sample();
        let data = archive
            .open_entry_by_name("INSTALL", None)
            .unwrap()
            .read_all()
            .unwrap();
        assert_eq!(data, b"INSTALL");
    }
}
