//! Opening archives from files and memory.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use super::{Archive, Flags, OpenMode};
use crate::READ_BUFFER_SIZE;
use crate::directory::Directory;
use crate::edit::ChangeLog;
use crate::format::header::CentralDirectoryHeader;
use crate::format::find_eocd;
use crate::store::Store;
use crate::{Error, Result};

/// Parses the trailing record and every central directory header.
pub(super) fn load_directory(store: &Store) -> Result<(Vec<CentralDirectoryHeader>, Vec<u8>)> {
    let (eocd, eocd_offset) = find_eocd(store, store.size())?;
    let directory_offset = u64::from(eocd.central_directory_offset);
    let directory_size = u64::from(eocd.central_directory_size);

    let mut reader = BufReader::with_capacity(
        READ_BUFFER_SIZE,
        store.section(directory_offset, directory_size),
    );
    let mut headers = Vec::with_capacity(usize::from(eocd.total_entries));
    let mut offset = directory_offset;
    for _ in 0..eocd.total_entries {
        let header = CentralDirectoryHeader::parse(&mut reader, offset)?;
        offset += header.encoded_len();
        headers.push(header);
    }
    if offset != directory_offset + directory_size {
        log::warn!(
            "central directory size mismatch: record says {} bytes, parsed {}",
            directory_size,
            offset - directory_offset
        );
    }
    log::debug!(
        "loaded {} entries, central directory at {:#x}, trailing record at {:#x}",
        headers.len(),
        directory_offset,
        eocd_offset
    );
    Ok((headers, eocd.comment))
}

impl Archive {
    fn with_store(
        path: Option<&Path>,
        mode: OpenMode,
        store: Store,
        persisted: bool,
    ) -> Result<Self> {
        let (directory, comment) = if persisted {
            let (headers, comment) = load_directory(&store)?;
            (Directory::from_headers(headers), comment)
        } else {
            (Directory::default(), Vec::new())
        };
        let flags = Flags {
            read_only: mode == OpenMode::ReadOnly,
            keep_empty: false,
        };
        Ok(Self {
            path: path.map(Path::to_path_buf),
            mode,
            store,
            persisted,
            truncated: false,
            directory,
            changes: ChangeLog::new(),
            original_comment: comment.clone(),
            comment,
            flags,
            original_flags: flags,
            default_password: None,
            finished: false,
        })
    }

    /// Opens an archive file.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file cannot be opened, or does not exist in
    ///   [`OpenMode::ReadOnly`] or [`OpenMode::ReadWrite`]
    /// - [`Error::InvalidFormat`] if an existing file is not a ZIP archive
    /// - [`Error::UnsupportedFeature`] for ZIP64 or multi-disk archives
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use zipwright::{Archive, OpenMode};
    ///
    /// let archive = Archive::open("archive.zip", OpenMode::ReadOnly)?;
    /// for entry in archive.entries() {
    ///     println!("{} ({} bytes)", entry.name, entry.size);
    /// }
    /// # Ok::<(), zipwright::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("opening {:?} ({:?})", path, mode);
        match mode {
            OpenMode::ReadOnly | OpenMode::ReadWrite => {
                let store = Store::open_file(File::open(path)?)?;
                Self::with_store(Some(path), mode, store, true)
            }
            OpenMode::CreateIfMissing => match File::open(path) {
                Ok(file) => Self::with_store(Some(path), mode, Store::open_file(file)?, true),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    Self::with_store(Some(path), mode, Store::Empty, false)
                }
                Err(e) => Err(Error::Io(e)),
            },
            OpenMode::CreateOrTruncate => {
                let mut archive = Self::with_store(Some(path), mode, Store::Empty, false)?;
                archive.truncated = path.exists();
                Ok(archive)
            }
        }
    }

    /// Opens an archive image held in memory.
    ///
    /// Commits replace the image; [`into_bytes`](Self::into_bytes) returns it.
    /// An empty buffer counts as a missing archive.
    ///
    /// # Errors
    ///
    /// As for [`open`](Self::open).
    pub fn from_bytes(bytes: Vec<u8>, mode: OpenMode) -> Result<Self> {
        match mode {
            OpenMode::ReadOnly | OpenMode::ReadWrite => {
                Self::with_store(None, mode, Store::Memory(bytes), true)
            }
            OpenMode::CreateIfMissing if bytes.is_empty() => {
                Self::with_store(None, mode, Store::Empty, false)
            }
            OpenMode::CreateIfMissing => Self::with_store(None, mode, Store::Memory(bytes), true),
            OpenMode::CreateOrTruncate => {
                let mut archive = Self::with_store(None, mode, Store::Empty, false)?;
                archive.truncated = !bytes.is_empty();
                Ok(archive)
            }
        }
    }

    /// Creates an empty in-memory archive.
    pub fn new_in_memory() -> Self {
        Self {
            path: None,
            mode: OpenMode::CreateOrTruncate,
            store: Store::Empty,
            persisted: false,
            truncated: false,
            directory: Directory::default(),
            changes: ChangeLog::new(),
            comment: Vec::new(),
            original_comment: Vec::new(),
            flags: Flags::default(),
            original_flags: Flags::default(),
            default_password: None,
            finished: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_open_missing_read_only_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Archive::open(dir.path().join("none.zip"), OpenMode::ReadOnly).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        let err = Archive::open(dir.path().join("none.zip"), OpenMode::ReadWrite).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_create_if_missing_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.zip");
        let archive = Archive::open(&path, OpenMode::CreateIfMissing).unwrap();
        assert!(archive.is_empty());
        drop(archive);
        assert!(!path.exists());
    }

    #[test]
    fn test_non_zip_is_format_error() {
        let err = Archive::from_bytes(b"definitely not a zip".to_vec(), OpenMode::ReadOnly)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text.zip");
        std::fs::write(&path, "hello").unwrap();
        let err = Archive::open(&path, OpenMode::CreateIfMissing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_truncate_ignores_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.zip");
        std::fs::write(&path, "not a zip").unwrap();
        let archive = Archive::open(&path, OpenMode::CreateOrTruncate).unwrap();
        assert!(archive.is_empty());
        assert!(archive.has_changes());
    }

    #[test]
    fn test_empty_archive_image() {
        let empty = [0x50, 0x4b, 0x05, 0x06, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let archive = Archive::from_bytes(empty.to_vec(), OpenMode::ReadOnly).unwrap();
        assert!(archive.is_empty());
        assert_eq!(archive.comment(), "");
    }
}
