//! Mutations recorded in the change log.
//!
//! Every operation validates its arguments before touching the directory
//! or the log, so a failed call leaves both exactly as they were.

use super::{Archive, ArchiveFlag, OpenMode};
use crate::codec::CompressionMethod;
use crate::crypto::Password;
use crate::directory::EntryRecord;
use crate::edit::Change;
use crate::entry_name::EntryName;
use crate::format::header::CentralDirectoryHeader;
use crate::format::{
    DOS_DIRECTORY_ATTRIBUTE, MAX_COMMENT_LENGTH, UNIX_DIRECTORY_MODE, UNIX_FILE_MODE,
    VERSION_MADE_BY, VERSION_NEEDED, flags,
};
use crate::source::{BufferSource, EntrySource};
use crate::timestamp::DosDateTime;
use crate::write::AddOptions;
use crate::{Error, Result};

/// Header shown for an entry whose bytes are not encoded yet.
fn pending_header(
    name: &str,
    options: &AddOptions,
    source: &dyn EntrySource,
    comment: Vec<u8>,
) -> CentralDirectoryHeader {
    let is_directory = name.ends_with('/');
    let mut header_flags = 0;
    if !name.is_ascii() {
        header_flags |= flags::UTF8;
    }
    if options.is_encrypted() && !is_directory {
        header_flags |= flags::ENCRYPTED | flags::DATA_DESCRIPTOR;
    }
    let method = if is_directory {
        CompressionMethod::Stored
    } else {
        options.method
    };
    CentralDirectoryHeader {
        version_made_by: VERSION_MADE_BY,
        version_needed: VERSION_NEEDED,
        flags: header_flags,
        method: method.as_u16(),
        modified: options
            .modified
            .or_else(|| source.modified())
            .unwrap_or_else(DosDateTime::now),
        crc32: 0,
        compressed_size: 0,
        uncompressed_size: source.len_hint().unwrap_or(0),
        disk_start: 0,
        internal_attributes: 0,
        external_attributes: if is_directory {
            (UNIX_DIRECTORY_MODE << 16) | DOS_DIRECTORY_ATTRIBUTE
        } else {
            UNIX_FILE_MODE << 16
        },
        local_header_offset: 0,
        name: name.as_bytes().to_vec(),
        extra: Vec::new(),
        comment,
    }
}

fn check_comment(comment: &str) -> Result<()> {
    if comment.len() > MAX_COMMENT_LENGTH {
        return Err(Error::CommentTooLong {
            len: comment.len(),
        });
    }
    Ok(())
}

impl Archive {
    fn ensure_writable(&self) -> Result<()> {
        if self.mode == OpenMode::ReadOnly || self.flags.read_only {
            return Err(Error::ReadOnly);
        }
        Ok(())
    }

    fn check_options(&self, name: &str, options: &AddOptions) -> Result<()> {
        if !options.method.is_supported() {
            return Err(Error::UnsupportedMethod {
                method_id: options.method.as_u16(),
            });
        }
        if options.level > 9 {
            return Err(Error::InvalidCompressionLevel {
                level: options.level,
            });
        }
        if options.is_encrypted() && options.password.is_none() && self.default_password.is_none()
        {
            return Err(Error::PasswordRequired {
                entry_name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Adds an entry and returns its index.
    ///
    /// The source is not read until commit (or until the pending entry is
    /// opened), so a [`FileSource`](crate::FileSource) for a missing file is
    /// accepted here and fails later with [`Error::Io`].
    ///
    /// With [`AddOptions::overwrite`] an existing live entry of the same name
    /// is replaced and its index returned.
    ///
    /// # Errors
    ///
    /// - [`Error::ReadOnly`] if the archive is read-only
    /// - [`Error::InvalidEntryName`] for unacceptable names
    /// - [`Error::EntryExists`] if the name is live and overwrite is off
    /// - [`Error::PasswordRequired`] if encryption is requested without any
    ///   password
    pub fn add(
        &mut self,
        name: &str,
        source: impl EntrySource + 'static,
        options: AddOptions,
    ) -> Result<usize> {
        self.ensure_writable()?;
        let name = EntryName::new(name)?;
        self.check_options(name.as_str(), &options)?;

        if let Some(index) = self.directory.find(name.as_str()) {
            if !options.overwrite {
                return Err(Error::EntryExists {
                    name: name.into_string(),
                });
            }
            self.replace(index, source, options)?;
            return Ok(index);
        }

        let header = pending_header(name.as_str(), &options, &source, Vec::new());
        let index = self.directory.insert(EntryRecord {
            name: name.as_str().to_string(),
            header,
        })?;
        self.changes.record(Change::Add {
            index,
            name: name.into_string(),
            source: Box::new(source),
            options,
        });
        Ok(index)
    }

    /// Adds an empty directory entry; a trailing `/` is appended if missing.
    ///
    /// # Errors
    ///
    /// As for [`add`](Self::add).
    pub fn add_directory(&mut self, name: &str) -> Result<usize> {
        let name = EntryName::directory(name)?;
        self.add(
            name.as_str(),
            BufferSource::new(Vec::new()),
            AddOptions::new().method(CompressionMethod::Stored),
        )
    }

    /// Replaces the contents of a live entry, keeping its name and comment.
    ///
    /// # Errors
    ///
    /// - [`Error::ReadOnly`] if the archive is read-only
    /// - [`Error::InvalidIndex`] if the index is not live
    pub fn replace(
        &mut self,
        index: usize,
        source: impl EntrySource + 'static,
        options: AddOptions,
    ) -> Result<()> {
        self.ensure_writable()?;
        let record = self.directory.live(index)?;
        self.check_options(&record.name, &options)?;

        let header = pending_header(&record.name, &options, &source, record.header.comment.clone());
        if let Some(record) = self.directory.get_mut(index) {
            record.header = header;
        }
        self.changes.record(Change::Replace {
            index,
            source: Box::new(source),
            options,
        });
        Ok(())
    }

    /// Removes a live entry.
    ///
    /// # Errors
    ///
    /// - [`Error::ReadOnly`] if the archive is read-only
    /// - [`Error::InvalidIndex`] if the index is not live
    pub fn remove(&mut self, index: usize) -> Result<()> {
        self.ensure_writable()?;
        self.directory.remove(index)?;
        self.changes.record(Change::Delete { index });
        Ok(())
    }

    /// Renames a live entry. Renaming to the current name does nothing.
    ///
    /// # Errors
    ///
    /// - [`Error::ReadOnly`] if the archive is read-only
    /// - [`Error::InvalidEntryName`] for unacceptable names
    /// - [`Error::InvalidIndex`] if the index is not live
    /// - [`Error::EntryExists`] if another live entry has the name
    pub fn rename(&mut self, index: usize, new_name: &str) -> Result<()> {
        self.ensure_writable()?;
        let new_name = EntryName::new(new_name)?;
        if self.directory.live(index)?.name == new_name.as_str() {
            return Ok(());
        }
        self.directory.rename(index, new_name.as_str())?;
        self.changes.record(Change::Rename {
            index,
            new_name: new_name.into_string(),
        });
        Ok(())
    }

    /// Re-encodes an entry with another method or level on commit.
    ///
    /// For an entry with pending contents this changes the pending options.
    ///
    /// # Errors
    ///
    /// - [`Error::ReadOnly`] if the archive is read-only
    /// - [`Error::InvalidIndex`] if the index is not live
    /// - [`Error::UnsupportedMethod`] / [`Error::InvalidCompressionLevel`]
    pub fn set_compression(
        &mut self,
        index: usize,
        method: CompressionMethod,
        level: u32,
    ) -> Result<()> {
        self.ensure_writable()?;
        self.directory.live(index)?;
        if !method.is_supported() {
            return Err(Error::UnsupportedMethod {
                method_id: method.as_u16(),
            });
        }
        if level > 9 {
            return Err(Error::InvalidCompressionLevel { level });
        }
        if self.changes.source_for(index).is_some() {
            if let Some(record) = self.directory.get_mut(index) {
                if !record.header.is_directory() {
                    record.header.method = method.as_u16();
                }
            }
        }
        self.changes.record(Change::Recompress {
            index,
            method,
            level,
        });
        Ok(())
    }

    /// Sets the archive comment; the empty string removes it.
    ///
    /// # Errors
    ///
    /// - [`Error::ReadOnly`] if the archive is read-only
    /// - [`Error::CommentTooLong`] above 65535 bytes
    pub fn set_comment(&mut self, comment: &str) -> Result<()> {
        self.ensure_writable()?;
        check_comment(comment)?;
        self.comment = comment.as_bytes().to_vec();
        Ok(())
    }

    /// Sets the comment of a live entry; the empty string removes it.
    ///
    /// # Errors
    ///
    /// - [`Error::ReadOnly`] if the archive is read-only
    /// - [`Error::InvalidIndex`] if the index is not live
    /// - [`Error::CommentTooLong`] above 65535 bytes
    pub fn set_entry_comment(&mut self, index: usize, comment: &str) -> Result<()> {
        self.ensure_writable()?;
        check_comment(comment)?;
        let record = self
            .directory
            .get_mut(index)
            .ok_or(Error::InvalidIndex { index })?;
        record.set_comment(comment);
        self.changes.record(Change::SetEntryComment {
            index,
            comment: comment.to_string(),
        });
        Ok(())
    }

    /// Sets an archive flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] when clearing the read-only flag of an
    /// archive opened with [`OpenMode::ReadOnly`].
    pub fn set_flag(&mut self, flag: ArchiveFlag, value: bool) -> Result<()> {
        if flag == ArchiveFlag::ReadOnly && !value && self.mode == OpenMode::ReadOnly {
            return Err(Error::ReadOnly);
        }
        self.flags.set(flag, value);
        Ok(())
    }

    /// Sets the password used for encrypted entries when none is given.
    ///
    /// Applies to [`open_entry`](Self::open_entry) and to new entries whose
    /// options request encryption without their own password.
    pub fn set_default_password(&mut self, password: Option<Password>) {
        self.default_password = password;
    }

    /// Discards every pending change of one entry slot.
    ///
    /// A pending add disappears; a deleted, renamed or replaced entry gets
    /// its committed state back.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidIndex`] if the slot does not exist
    /// - [`Error::EntryExists`] if the committed name is now used by
    ///   another entry; nothing is changed
    pub fn unchange(&mut self, index: usize) -> Result<()> {
        self.directory.revert(index)?;
        self.changes.discard(index);
        Ok(())
    }

    /// Discards every pending change, archive comment and flags included.
    pub fn unchange_all(&mut self) {
        self.directory.revert_all();
        self.changes.clear();
        self.unchange_archive();
    }

    /// Restores the committed archive comment and flags.
    pub fn unchange_archive(&mut self) {
        self.comment = self.original_comment.clone();
        self.flags = self.original_flags;
    }
}
