//! Streaming reader over one entry's decompressed bytes.

use std::io::{self, Read};

use crate::checksum::{Checksum, Crc32};
use crate::codec::{
    CompressionMethod, build_decoder, codec_error, initial_reservation, staging_buffer,
};
use crate::crypto::{ENCRYPTION_HEADER_LEN, Password, ZipCryptoReader, check_byte};
use crate::error::map_io_error;
use crate::format::flags;
use crate::format::header::{CentralDirectoryHeader, LocalFileHeader};
use crate::source::EntrySource;
use crate::store::Store;
use crate::{Error, Result};

/// Size and CRC a committed entry must reproduce.
#[derive(Debug, Clone, Copy)]
struct Expected {
    size: u64,
    crc32: u32,
    packed: u64,
}

/// A reader over the decompressed bytes of one entry.
///
/// Implements [`Read`]. For committed entries the byte count and CRC-32 are
/// checked against the central directory as soon as the last byte has been
/// produced; a mismatch is reported as an [`io::Error`] wrapping
/// [`Error::CrcMismatch`] or [`Error::SizeMismatch`]. [`read_all`] and
/// [`read_len`] unwrap it back into the typed error.
///
/// Readers borrow the archive immutably, so several may be open at once.
///
/// [`read_all`]: Self::read_all
/// [`read_len`]: Self::read_len
pub struct EntryReader<'a> {
    index: usize,
    name: String,
    method_id: u16,
    inner: Box<dyn Read + Send + 'a>,
    expected: Option<Expected>,
    crc: Crc32,
    bytes_read: u64,
    verified: bool,
}

impl std::fmt::Debug for EntryReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryReader")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("bytes_read", &self.bytes_read)
            .finish()
    }
}

impl<'a> EntryReader<'a> {
    /// Opens a committed entry stored in `store`.
    pub(crate) fn committed(
        store: &'a Store,
        index: usize,
        name: &str,
        header: &CentralDirectoryHeader,
        password: Option<&Password>,
    ) -> Result<Self> {
        let method = CompressionMethod::from_u16(header.method);
        if !method.is_supported() {
            return Err(Error::UnsupportedMethod {
                method_id: header.method,
            });
        }
        if header.flags & (flags::STRONG_ENCRYPTION | flags::MASKED_HEADER) != 0 {
            return Err(Error::UnsupportedFeature {
                feature: "strong encryption",
            });
        }

        let offset = header.local_header_offset;
        let local = LocalFileHeader::parse(&mut store.section(offset, u64::MAX), offset)?;
        let data_offset = offset + local.encoded_len();
        if data_offset.saturating_add(header.compressed_size) > store.size() {
            return Err(Error::corrupt_header(
                offset,
                "entry data extends past the end of the archive",
            ));
        }
        let section = store.section(data_offset, header.compressed_size);

        let inner: Box<dyn Read + Send + 'a> = if header.is_encrypted() {
            let password = password.ok_or_else(|| Error::PasswordRequired {
                entry_name: name.to_string(),
            })?;
            let payload_len = header
                .compressed_size
                .checked_sub(ENCRYPTION_HEADER_LEN)
                .ok_or_else(|| {
                    Error::corrupt_header(offset, "encrypted entry shorter than its header")
                })?;
            let check = check_byte(
                header.crc32,
                header.modified.time_word(),
                header.uses_data_descriptor(),
            );
            let decrypted = ZipCryptoReader::new(section, password, check)?.ok_or_else(|| {
                Error::WrongPassword {
                    entry_name: name.to_string(),
                }
            })?;
            Box::new(build_decoder(decrypted, method, payload_len)?)
        } else {
            Box::new(build_decoder(section, method, header.compressed_size)?)
        };

        log::trace!("opened entry {:?} at data offset {:#x}", name, data_offset);
        Ok(Self {
            index,
            name: name.to_string(),
            method_id: header.method,
            inner,
            expected: Some(Expected {
                size: header.uncompressed_size,
                crc32: header.crc32,
                packed: header.compressed_size,
            }),
            crc: Crc32::new(),
            bytes_read: 0,
            verified: false,
        })
    }

    /// Opens an entry whose bytes come from an uncommitted source.
    pub(crate) fn pending(index: usize, name: &str, source: &'a dyn EntrySource) -> Result<Self> {
        Ok(Self {
            index,
            name: name.to_string(),
            method_id: 0,
            inner: source.materialize()?,
            expected: None,
            crc: Crc32::new(),
            bytes_read: 0,
            verified: false,
        })
    }

    /// Returns the slot index of the entry.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the entry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of decompressed bytes produced so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Returns the recorded uncompressed size, unknown for pending entries.
    pub fn size(&self) -> Option<u64> {
        self.expected.map(|e| e.size)
    }

    /// Reads the rest of the entry.
    ///
    /// # Errors
    ///
    /// Returns the typed error behind any failed read, e.g.
    /// [`Error::CrcMismatch`] or [`Error::Codec`].
    pub fn read_all(mut self) -> Result<Vec<u8>> {
        let reserve = self.expected.map_or(0, |e| {
            initial_reservation(e.size.saturating_sub(self.bytes_read), e.packed)
        });
        let mut out = staging_buffer(reserve)?;
        self.read_to_end(&mut out).map_err(map_io_error)?;
        Ok(out)
    }

    /// Reads up to `expected` bytes in one pass.
    ///
    /// Allocates exactly `expected` bytes up front, reads until that many
    /// bytes arrived or the entry ended, and truncates the result to the
    /// count actually read. A short entry is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the buffer cannot be
    /// allocated, and the typed error behind any failed read.
    pub fn read_len(&mut self, expected: u64) -> Result<Vec<u8>> {
        let mut out = staging_buffer(expected)?;
        out.resize(expected as usize, 0);
        let mut filled = 0;
        while filled < out.len() {
            match self.read(&mut out[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(map_io_error(e)),
            }
        }
        out.truncate(filled);
        Ok(out)
    }

    fn check(&mut self, n: usize) -> Result<()> {
        let Some(expected) = self.expected else {
            return Ok(());
        };
        if self.bytes_read > expected.size || (n == 0 && self.bytes_read < expected.size) {
            return Err(Error::SizeMismatch {
                entry_name: self.name.clone(),
                expected: expected.size,
                actual: self.bytes_read,
            });
        }
        if self.bytes_read == expected.size && !self.verified {
            self.verified = true;
            let actual = self.crc.finalize();
            if actual != expected.crc32 {
                return Err(Error::crc_mismatch(
                    Some(self.index),
                    self.name.clone(),
                    expected.crc32,
                    actual,
                ));
            }
        }
        Ok(())
    }
}

impl Read for EntryReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = self.inner.read(buf).map_err(|e| {
            if self.expected.is_some() {
                codec_error(self.method_id, e).into_io()
            } else {
                e
            }
        })?;
        self.crc.update(&buf[..n]);
        self.bytes_read += n as u64;
        self.check(n).map_err(Error::into_io)?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BufferSource;
    use crate::write::{NewEntry, ZipWriter};
    use std::io::Cursor;

    fn archive_with(data: &[u8], password: Option<&Password>) -> (Store, CentralDirectoryHeader) {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new())).unwrap();
        let mut entry = NewEntry::new("file.txt");
        entry.password = password;
        let header = writer.add_stream(&entry, data).unwrap().clone();
        let bytes = writer.finish(b"").unwrap().into_inner();
        (Store::Memory(bytes), header)
    }

    #[test]
    fn test_read_committed_entry() {
        let (store, header) = archive_with(b"abcdef", None);
        let reader = EntryReader::committed(&store, 0, "file.txt", &header, None).unwrap();
        assert_eq!(reader.size(), Some(6));
        assert_eq!(reader.read_all().unwrap(), b"abcdef");
    }

    #[test]
    fn test_read_len_truncates_short_read() {
        let (store, header) = archive_with(b"abcdef", None);
        let mut reader = EntryReader::committed(&store, 0, "file.txt", &header, None).unwrap();
        assert_eq!(reader.read_len(4).unwrap(), b"abcd");
        assert_eq!(reader.read_len(100).unwrap(), b"ef");
        assert_eq!(reader.read_len(100).unwrap(), b"");
    }

    #[test]
    fn test_crc_mismatch_detected() {
        let (store, mut header) = archive_with(b"abcdef", None);
        header.crc32 ^= 1;
        let reader = EntryReader::committed(&store, 0, "file.txt", &header, None).unwrap();
        let err = reader.read_all().unwrap_err();
        assert!(matches!(err, Error::CrcMismatch { entry_index: Some(0), .. }));
    }

    #[test]
    fn test_size_mismatch_detected() {
        let (store, mut header) = archive_with(b"abcdef", None);
        header.uncompressed_size = 10;
        let reader = EntryReader::committed(&store, 0, "file.txt", &header, None).unwrap();
        let err = reader.read_all().unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { expected: 10, actual: 6, .. }));
    }

    #[test]
    fn test_huge_size_claim_is_not_preallocated() {
        let (store, mut header) = archive_with(b"abcdef", None);
        header.uncompressed_size = u64::MAX;
        let reader = EntryReader::committed(&store, 0, "file.txt", &header, None).unwrap();
        let err = reader.read_all().unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { actual: 6, .. }));
    }

    #[test]
    fn test_encrypted_entry() {
        let password = Password::new("secret");
        let (store, header) = archive_with(b"hidden text", Some(&password));

        let err = EntryReader::committed(&store, 0, "file.txt", &header, None).unwrap_err();
        assert!(matches!(err, Error::PasswordRequired { .. }));

        let reader =
            EntryReader::committed(&store, 0, "file.txt", &header, Some(&password)).unwrap();
        assert_eq!(reader.read_all().unwrap(), b"hidden text");
    }

    #[test]
    fn test_unsupported_method() {
        let (store, mut header) = archive_with(b"abc", None);
        header.method = 12;
        let err = EntryReader::committed(&store, 0, "file.txt", &header, None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedMethod { method_id: 12 }));
    }

    #[test]
    fn test_data_past_end_is_corrupt() {
        let (store, mut header) = archive_with(b"abc", None);
        header.compressed_size = 10_000;
        let err = EntryReader::committed(&store, 0, "file.txt", &header, None).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { .. }));
    }

    #[test]
    fn test_pending_entry_streams_source() {
        let source = BufferSource::new("pending bytes");
        let reader = EntryReader::pending(3, "p.txt", &source).unwrap();
        assert_eq!(reader.index(), 3);
        assert_eq!(reader.size(), None);
        assert_eq!(reader.read_all().unwrap(), b"pending bytes");
    }

    #[test]
    fn test_concurrent_readers() {
        let (store, header) = archive_with(b"shared", None);
        let mut a = EntryReader::committed(&store, 0, "file.txt", &header, None).unwrap();
        let mut b = EntryReader::committed(&store, 0, "file.txt", &header, None).unwrap();
        assert_eq!(a.read_len(3).unwrap(), b"sha");
        assert_eq!(b.read_len(6).unwrap(), b"shared");
        assert_eq!(a.read_len(3).unwrap(), b"red");
    }
}
