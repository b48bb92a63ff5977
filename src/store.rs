//! Positional byte stores backing an open archive.
//!
//! Reading an entry never moves a shared cursor: every access names its
//! offset. This lets several [`EntryReader`](crate::EntryReader)s borrow the
//! same archive at once.

use std::fs::File;
use std::io::{self, Read};

/// Random access reads from a data source.
pub trait ReadAt {
    /// Reads data at `offset` into `buf`, returning the number of bytes read.
    ///
    /// Returns `Ok(0)` at or past the end of the data.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Fills `buf` from `offset`, failing with `UnexpectedEof` on short data.
    fn read_exact_at(&self, mut offset: u64, mut buf: &mut [u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.read_at(offset, buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "failed to fill whole buffer",
                    ));
                }
                Ok(n) => {
                    buf = &mut buf[n..];
                    offset += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl ReadAt for [u8] {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= self.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }
}

impl ReadAt for File {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        #[cfg(unix)]
        {
            std::os::unix::fs::FileExt::read_at(self, buf, offset)
        }

        #[cfg(windows)]
        {
            std::os::windows::fs::FileExt::seek_read(self, buf, offset)
        }

        #[cfg(not(any(unix, windows)))]
        {
            use std::io::{Seek, SeekFrom};
            let mut file = self;
            file.seek(SeekFrom::Start(offset))?;
            file.read(buf)
        }
    }
}

/// The bytes an archive was loaded from.
#[derive(Debug, Default)]
pub(crate) enum Store {
    /// Nothing committed yet.
    #[default]
    Empty,
    /// An open archive file.
    File {
        /// Read handle.
        file: File,
        /// Length at open time.
        size: u64,
    },
    /// An in-memory archive image.
    Memory(Vec<u8>),
}

impl Store {
    /// Opens a file store and records its length.
    pub(crate) fn open_file(file: File) -> io::Result<Self> {
        let size = file.metadata()?.len();
        Ok(Store::File { file, size })
    }

    /// Total number of bytes.
    pub(crate) fn size(&self) -> u64 {
        match self {
            Store::Empty => 0,
            Store::File { size, .. } => *size,
            Store::Memory(bytes) => bytes.len() as u64,
        }
    }

    /// Returns a reader over `len` bytes starting at `offset`.
    pub(crate) fn section(&self, offset: u64, len: u64) -> SectionReader<'_> {
        SectionReader {
            store: self,
            position: offset,
            end: offset.saturating_add(len),
        }
    }
}

impl ReadAt for Store {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Store::Empty => Ok(0),
            Store::File { file, .. } => file.read_at(offset, buf),
            Store::Memory(bytes) => bytes.as_slice().read_at(offset, buf),
        }
    }
}

/// A `Read` view of one byte range of a [`Store`].
pub(crate) struct SectionReader<'a> {
    store: &'a Store,
    position: u64,
    end: u64,
}

impl Read for SectionReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.end.saturating_sub(self.position);
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let max = remaining.min(buf.len() as u64) as usize;
        let n = self.store.read_at(self.position, &mut buf[..max])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("entry data truncated at offset {:#x}", self.position),
            ));
        }
        self.position += n as u64;
        Ok(n)
    }
}
