//! Committing pending changes.
//!
//! A commit writes a complete new archive and then swaps it in. For file
//! archives the new image goes to `<name>.tmp` in the target's directory
//! and replaces the target with a rename, so a failed commit leaves the
//! original file untouched. In-memory archives build a new image and
//! replace the old one.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Cursor, Seek, Write};
use std::path::{Path, PathBuf};

use super::Archive;
use super::open::load_directory;
use crate::directory::Directory;
use crate::edit::CommitResult;
use crate::format::header::{CentralDirectoryHeader, LocalFileHeader};
use crate::read::EntryReader;
use crate::store::{SectionReader, Store};
use crate::write::{NewEntry, ZipWriter};
use crate::{Error, Result};

/// Returns the raw bytes of a committed entry.
fn raw_data<'a>(store: &'a Store, header: &CentralDirectoryHeader) -> Result<SectionReader<'a>> {
    let offset = header.local_header_offset;
    let local = LocalFileHeader::parse(&mut store.section(offset, u64::MAX), offset)?;
    let data_offset = offset + local.encoded_len();
    if data_offset.saturating_add(header.compressed_size) > store.size() {
        return Err(Error::corrupt_header(
            offset,
            "entry data extends past the end of the archive",
        ));
    }
    Ok(store.section(data_offset, header.compressed_size))
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("archive path {:?} has no file name", path),
        ))
    })?;
    let mut temp_name = OsString::from(file_name);
    temp_name.push(".tmp");
    Ok(path.with_file_name(temp_name))
}

impl Archive {
    /// Writes every pending change.
    ///
    /// Does nothing when there are no changes. When no live entries remain
    /// and [`ArchiveFlag::KeepEmpty`](crate::ArchiveFlag::KeepEmpty) is not
    /// set, the archive file is removed instead of written.
    ///
    /// On success the archive is reloaded from the new image: every index
    /// refers to the committed entry order and the change log is empty. On
    /// failure the target is unchanged and the pending changes are kept.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if a source or the target cannot be read or written
    /// - [`Error::CrcMismatch`] / [`Error::SizeMismatch`] if an entry being
    ///   recompressed is corrupt
    /// - [`Error::PasswordRequired`] if an encrypted entry must be
    ///   re-encoded, or a new entry encrypted, without a password
    /// - [`Error::UnsupportedFeature`] if the result would need ZIP64
    pub fn commit(&mut self) -> Result<CommitResult> {
        if !self.has_changes() {
            return Ok(CommitResult::default());
        }

        if self.is_empty() && !self.flags.keep_empty {
            let entries_deleted = self.deleted_count();
            self.remove_target()?;
            self.reset(Directory::default(), Vec::new(), false);
            log::debug!("committed empty archive, target removed");
            return Ok(CommitResult {
                entries_deleted,
                ..CommitResult::default()
            });
        }

        let result = match self.path.clone() {
            Some(path) => self.commit_file(&path)?,
            None => self.commit_memory()?,
        };
        let (headers, comment) = load_directory(&self.store)?;
        self.reset(Directory::from_headers(headers), comment, true);
        log::debug!(
            "committed {} entries ({} copied, {} written, {} recompressed, {} deleted)",
            result.total_entries(),
            result.entries_copied,
            result.entries_written,
            result.entries_recompressed,
            result.entries_deleted
        );
        Ok(result)
    }

    /// Commits and consumes the archive.
    ///
    /// The archive is consumed even when the commit fails; its pending
    /// changes are then lost.
    ///
    /// # Errors
    ///
    /// As for [`commit`](Self::commit).
    pub fn close(mut self) -> Result<CommitResult> {
        let result = self.commit();
        self.finished = true;
        result
    }

    /// Drops every pending change and consumes the archive.
    pub fn discard(mut self) {
        self.finished = true;
    }

    /// Commits and returns the bytes of the resulting archive.
    ///
    /// An archive committed empty (and not kept) yields no bytes.
    ///
    /// # Errors
    ///
    /// As for [`commit`](Self::commit), plus [`Error::Io`] if a file
    /// archive cannot be read back.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        let result = self.commit();
        self.finished = true;
        let _ = result?;
        match std::mem::take(&mut self.store) {
            Store::Memory(bytes) => Ok(bytes),
            Store::File { .. } => match &self.path {
                Some(path) => Ok(fs::read(path)?),
                None => Ok(Vec::new()),
            },
            Store::Empty => Ok(Vec::new()),
        }
    }

    fn deleted_count(&self) -> usize {
        (0..self.directory.slot_count())
            .filter(|&i| self.directory.original(i).is_some() && self.directory.get(i).is_none())
            .count()
    }

    fn reset(&mut self, directory: Directory, comment: Vec<u8>, persisted: bool) {
        self.directory = directory;
        self.changes.clear();
        self.original_comment = comment.clone();
        self.comment = comment;
        self.original_flags = self.flags;
        self.persisted = persisted;
        self.truncated = false;
    }

    /// Removes the committed archive.
    fn remove_target(&mut self) -> Result<()> {
        let Some(path) = self.path.clone() else {
            self.store = Store::Empty;
            return Ok(());
        };
        let previous = std::mem::take(&mut self.store);
        let reopen = matches!(previous, Store::File { .. });
        drop(previous);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                if reopen {
                    self.reopen(&path);
                }
                Err(Error::Io(e))
            }
        }
    }

    fn reopen(&mut self, path: &Path) {
        match File::open(path).and_then(Store::open_file) {
            Ok(store) => self.store = store,
            Err(e) => log::warn!("failed to reopen {:?}: {}", path, e),
        }
    }

    fn commit_memory(&mut self) -> Result<CommitResult> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()))?;
        let result = self.write_entries(&mut writer)?;
        let bytes = writer.finish(&self.comment)?.into_inner();
        self.store = Store::Memory(bytes);
        Ok(result)
    }

    fn commit_file(&mut self, path: &Path) -> Result<CommitResult> {
        let temp = temp_path(path)?;
        if temp.exists() {
            log::warn!("overwriting stale temporary file {:?}", temp);
        }

        let written = self.write_temp(&temp);
        let result = match written {
            Ok(result) => result,
            Err(e) => {
                let _ = fs::remove_file(&temp);
                return Err(e);
            }
        };

        let previous = std::mem::take(&mut self.store);
        let reopen = matches!(previous, Store::File { .. });
        drop(previous);
        if let Err(e) = fs::rename(&temp, path) {
            let _ = fs::remove_file(&temp);
            if reopen {
                self.reopen(path);
            }
            return Err(Error::Io(e));
        }
        self.store = Store::open_file(File::open(path)?)?;
        Ok(result)
    }

    fn write_temp(&self, temp: &Path) -> Result<CommitResult> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp)?;
        let mut writer = ZipWriter::new(BufWriter::new(file))?;
        let result = self.write_entries(&mut writer)?;
        let file = writer
            .finish(&self.comment)?
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))?;
        file.sync_all()?;
        Ok(result)
    }

    /// Produces every live entry, in slot order.
    fn write_entries<W: Write + Seek + Send>(
        &self,
        writer: &mut ZipWriter<W>,
    ) -> Result<CommitResult> {
        let mut result = CommitResult {
            entries_deleted: self.deleted_count(),
            ..CommitResult::default()
        };

        for index in self.directory.live_indices() {
            let record = self.directory.live(index)?;
            let header = &record.header;

            let written = if let Some((source, options)) = self.changes.source_for(index) {
                let password = if options.is_encrypted() {
                    let resolved = options.password.as_ref().or(self.default_password.as_ref());
                    if resolved.is_none() {
                        return Err(Error::PasswordRequired {
                            entry_name: record.name.clone(),
                        });
                    }
                    resolved
                } else {
                    None
                };
                let entry = NewEntry {
                    name: &record.name,
                    method: options.method,
                    level: options.level,
                    modified: header.modified,
                    comment: &header.comment,
                    password,
                };
                let data = source.materialize()?;
                result.entries_written += 1;
                writer.add_stream(&entry, data)?
            } else if let Some((method, level)) = self.changes.recompression_for(index) {
                let password = self.default_password.as_ref();
                let data = EntryReader::committed(&self.store, index, &record.name, header, password)?;
                let entry = NewEntry {
                    name: &record.name,
                    method,
                    level,
                    modified: header.modified,
                    comment: &header.comment,
                    password: if header.is_encrypted() { password } else { None },
                };
                result.entries_recompressed += 1;
                writer.add_stream(&entry, data)?
            } else {
                let data = raw_data(&self.store, header)?;
                result.entries_copied += 1;
                writer.copy_raw(header, data)?
            };

            result.total_bytes += written.uncompressed_size;
            result.packed_bytes += written.compressed_size;
        }
        Ok(result)
    }
}
