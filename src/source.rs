//! Suppliers of bytes for new and replaced entries.
//!
//! An [`EntrySource`] is handed to [`Archive::add`](crate::Archive::add) or
//! [`Archive::replace`](crate::Archive::replace) and kept in the pending
//! change log until commit. The engine only ever asks a source to
//! [`materialize`](EntrySource::materialize) its bytes, so new kinds of
//! sources plug in by implementing the trait.
//!
//! # Missing files
//!
//! [`FileSource`] is lazy: constructing one, or adding it to an archive,
//! never touches the filesystem. A path that does not exist surfaces as
//! [`Error::Io`](crate::Error::Io) only when the bytes are needed, during
//! commit or when the pending entry is opened for reading.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use filetime::FileTime;

use crate::timestamp::DosDateTime;

/// A polymorphic supplier of entry bytes.
pub trait EntrySource: Send + std::fmt::Debug {
    /// Opens a fresh stream over the source's bytes.
    ///
    /// May be called more than once, e.g. to read a pending entry before
    /// it is committed.
    fn materialize(&self) -> io::Result<Box<dyn Read + Send + '_>>;

    /// Number of bytes the stream will yield, when cheaply known.
    fn len_hint(&self) -> Option<u64> {
        None
    }

    /// Modification time to record when the options do not set one.
    fn modified(&self) -> Option<DosDateTime> {
        None
    }
}

/// An entry source that owns an in-memory byte sequence.
///
/// # Example
///
/// ```rust
/// use zipwright::{BufferSource, EntrySource};
///
/// let source = BufferSource::new("abcdef");
/// assert_eq!(source.len_hint(), Some(6));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct BufferSource {
    data: Vec<u8>,
}

impl BufferSource {
    /// Creates a source from anything convertible into bytes.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Returns the bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl std::fmt::Debug for BufferSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferSource")
            .field("len", &self.data.len())
            .finish()
    }
}

impl EntrySource for BufferSource {
    fn materialize(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        Ok(Box::new(self.data.as_slice()))
    }

    fn len_hint(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}

impl From<Vec<u8>> for BufferSource {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for BufferSource {
    fn from(data: &[u8]) -> Self {
        Self::new(data)
    }
}

impl From<&str> for BufferSource {
    fn from(data: &str) -> Self {
        Self::new(data)
    }
}

/// An entry source that reads a slice of a file on disk.
///
/// The file is opened each time the source is materialized.
///
/// # Example
///
/// ```rust
/// use zipwright::{EntrySource, FileSource};
///
/// // Does not fail even though the file does not exist.
/// let source = FileSource::new("/nonexistent/input.bin");
/// assert!(source.materialize().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
    start: u64,
    length: Option<u64>,
}

impl FileSource {
    /// Reads the whole file.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            start: 0,
            length: None,
        }
    }

    /// Reads `length` bytes starting at `start`, or to end of file when
    /// `length` is `None`.
    pub fn slice(path: impl AsRef<Path>, start: u64, length: Option<u64>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            start,
            length,
        }
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the start offset.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Returns the requested length, `None` meaning "to end of file".
    pub fn length(&self) -> Option<u64> {
        self.length
    }
}

impl EntrySource for FileSource {
    fn materialize(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        let mut file = File::open(&self.path)?;
        if self.start > 0 {
            file.seek(SeekFrom::Start(self.start))?;
        }
        let reader = io::BufReader::new(file);
        match self.length {
            Some(length) => Ok(Box::new(reader.take(length))),
            None => Ok(Box::new(reader)),
        }
    }

    /// Computed from file metadata; `None` while the file is missing.
    fn len_hint(&self) -> Option<u64> {
        let file_len = std::fs::metadata(&self.path).ok()?.len();
        let available = file_len.saturating_sub(self.start);
        Some(match self.length {
            Some(length) => length.min(available),
            None => available,
        })
    }

    fn modified(&self) -> Option<DosDateTime> {
        let metadata = std::fs::metadata(&self.path).ok()?;
        let mtime = FileTime::from_last_modification_time(&metadata);
        Some(DosDateTime::from_unix_secs(mtime.unix_seconds()))
    }
}
