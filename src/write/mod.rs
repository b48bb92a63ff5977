//! Streaming ZIP writer.
//!
//! [`ZipWriter`] produces an archive in one forward pass: for every entry a
//! local header, the (optionally encrypted) compressed data and, where
//! needed, a data descriptor; then the central directory and the trailing
//! record. Sizes and CRC are not known before an entry is encoded, so the
//! local header is written with zeros and patched afterwards by seeking
//! back. Encrypted entries are the exception: their check byte must not
//! depend on the CRC, so they carry a data descriptor instead.
//!
//! [`Archive::commit`](crate::Archive::commit) drives this writer; it can
//! also be used on its own.
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use zipwright::write::{NewEntry, ZipWriter};
//!
//! let mut writer = ZipWriter::new(Cursor::new(Vec::new()))?;
//! writer.add_stream(&NewEntry::new("hello.txt"), &b"Hello, World!"[..])?;
//! let bytes = writer.finish(b"")?.into_inner();
//! assert_eq!(&bytes[..4], b"PK\x03\x04");
//! # Ok::<(), zipwright::Error>(())
//! ```

pub(crate) mod options;

pub use options::AddOptions;

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::checksum::EntryDigestReader;
use crate::codec::{CompressionMethod, DEFAULT_LEVEL, build_encoder};
use crate::crypto::{Password, ZipCryptoWriter, check_byte};
use crate::error::map_io_error;
use crate::format::header::{CentralDirectoryHeader, DataDescriptor, LocalFileHeader};
use crate::format::{
    DOS_DIRECTORY_ATTRIBUTE, EndOfCentralDirectory, MAX_ZIP32_VALUE, UNIX_DIRECTORY_MODE,
    UNIX_FILE_MODE, VERSION_MADE_BY, VERSION_NEEDED, flags,
};
use crate::format::reader::write_u32_le;
use crate::timestamp::DosDateTime;
use crate::{Error, Result};

/// State of the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    /// Accepting new entries.
    AcceptingEntries,
    /// A write failed; the output is unusable.
    Poisoned,
}

/// Header fields of an entry about to be encoded.
#[derive(Debug, Clone)]
pub struct NewEntry<'a> {
    /// Entry name; a trailing `/` marks a directory.
    pub name: &'a str,
    /// Compression method.
    pub method: CompressionMethod,
    /// Deflate level.
    pub level: u32,
    /// Modification time.
    pub modified: DosDateTime,
    /// Raw comment bytes.
    pub comment: &'a [u8],
    /// Encrypts the data with the traditional PKWARE cipher.
    pub password: Option<&'a Password>,
}

impl<'a> NewEntry<'a> {
    /// Deflate at the default level, modified now, no comment.
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            method: CompressionMethod::Deflate,
            level: DEFAULT_LEVEL,
            modified: DosDateTime::now(),
            comment: &[],
            password: None,
        }
    }

    fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }
}

/// A ZIP archive writer over a seekable sink.
pub struct ZipWriter<W: Write + Seek> {
    sink: W,
    /// Sink position where the archive begins.
    base: u64,
    state: WriterState,
    entries: Vec<CentralDirectoryHeader>,
}

impl<W: Write + Seek + Send> ZipWriter<W> {
    /// Starts an archive at the sink's current position.
    pub fn new(mut sink: W) -> Result<Self> {
        let base = sink.stream_position()?;
        Ok(Self {
            sink,
            base,
            state: WriterState::AcceptingEntries,
            entries: Vec::new(),
        })
    }

    /// Returns the central directory headers written so far.
    pub fn entries(&self) -> &[CentralDirectoryHeader] {
        &self.entries
    }

    fn position(&mut self) -> Result<u64> {
        Ok(self.sink.stream_position()? - self.base)
    }

    fn check_state(&self) -> Result<()> {
        match self.state {
            WriterState::AcceptingEntries => Ok(()),
            WriterState::Poisoned => Err(Error::Io(io::Error::other(
                "writer is unusable after a failed write",
            ))),
        }
    }

    /// Encodes an entry from a byte stream.
    ///
    /// Directories are always stored empty; `data` is not read for them and
    /// no password applies.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedMethod`] for methods without an encoder
    /// - [`Error::UnsupportedFeature`] if the entry needs ZIP64
    /// - [`Error::Io`] if reading `data` or writing the sink fails
    pub fn add_stream<R: Read>(
        &mut self,
        entry: &NewEntry<'_>,
        data: R,
    ) -> Result<&CentralDirectoryHeader> {
        self.check_state()?;
        let is_directory = entry.is_directory();
        let method = if is_directory {
            CompressionMethod::Stored
        } else {
            entry.method
        };
        if !method.is_supported() {
            return Err(Error::UnsupportedMethod {
                method_id: method.as_u16(),
            });
        }
        let password = entry.password.filter(|_| !is_directory);

        let mut header_flags = 0;
        if !entry.name.is_ascii() {
            header_flags |= flags::UTF8;
        }
        if password.is_some() {
            header_flags |= flags::ENCRYPTED | flags::DATA_DESCRIPTOR;
        }

        let header_offset = self.position()?;
        let mut central = CentralDirectoryHeader {
            version_made_by: VERSION_MADE_BY,
            version_needed: VERSION_NEEDED,
            flags: header_flags,
            method: method.as_u16(),
            modified: entry.modified,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            disk_start: 0,
            internal_attributes: 0,
            external_attributes: if is_directory {
                (UNIX_DIRECTORY_MODE << 16) | DOS_DIRECTORY_ATTRIBUTE
            } else {
                UNIX_FILE_MODE << 16
            },
            local_header_offset: header_offset,
            name: entry.name.as_bytes().to_vec(),
            extra: Vec::new(),
            comment: entry.comment.to_vec(),
        };

        let result = self.encode_entry(&mut central, method, entry.level, password, data);
        if result.is_err() {
            self.state = WriterState::Poisoned;
        }
        result?;

        log::debug!(
            "wrote entry {:?}: {} -> {} bytes ({})",
            entry.name,
            central.uncompressed_size,
            central.compressed_size,
            method
        );
        self.entries.push(central);
        Ok(&self.entries[self.entries.len() - 1])
    }

    fn encode_entry<R: Read>(
        &mut self,
        central: &mut CentralDirectoryHeader,
        method: CompressionMethod,
        level: u32,
        password: Option<&Password>,
        data: R,
    ) -> Result<()> {
        let header_offset = central.local_header_offset;
        let local = LocalFileHeader::from_central(central);
        local.write(&mut self.sink)?;
        let data_start = self.position()?;

        let mut reader = EntryDigestReader::new(data);
        if central.is_directory() {
            // nothing to encode
        } else if let Some(password) = password {
            let check = check_byte(0, central.modified.time_word(), true);
            let crypt = ZipCryptoWriter::new(&mut self.sink, password, check)?;
            let mut encoder = build_encoder(crypt, method, level)?;
            io::copy(&mut reader, &mut encoder).map_err(map_io_error)?;
            encoder.finish()?;
        } else {
            let mut encoder = build_encoder(&mut self.sink, method, level)?;
            io::copy(&mut reader, &mut encoder).map_err(map_io_error)?;
            encoder.finish()?;
        }

        let data_end = self.position()?;
        central.crc32 = reader.crc();
        central.compressed_size = data_end - data_start;
        central.uncompressed_size = reader.size();
        if central.compressed_size > MAX_ZIP32_VALUE || central.uncompressed_size > MAX_ZIP32_VALUE
        {
            return Err(Error::UnsupportedFeature {
                feature: "ZIP64 (entries above 4 GiB)",
            });
        }

        if central.uses_data_descriptor() {
            DataDescriptor {
                crc32: central.crc32,
                compressed_size: central.compressed_size,
                uncompressed_size: central.uncompressed_size,
            }
            .write(&mut self.sink)?;
        } else {
            self.sink.seek(SeekFrom::Start(
                self.base + header_offset + LocalFileHeader::CRC_FIELD_OFFSET,
            ))?;
            write_u32_le(&mut self.sink, central.crc32)?;
            write_u32_le(&mut self.sink, central.compressed_size as u32)?;
            write_u32_le(&mut self.sink, central.uncompressed_size as u32)?;
            self.sink.seek(SeekFrom::Start(self.base + data_end))?;
        }
        Ok(())
    }

    /// Copies an already encoded entry.
    ///
    /// `data` yields the entry's raw (compressed, possibly encrypted) bytes;
    /// exactly `header.compressed_size` of them are copied. The local header
    /// is rebuilt from `header`, so a renamed or re-commented entry keeps its
    /// data untouched.
    pub fn copy_raw<R: Read>(
        &mut self,
        header: &CentralDirectoryHeader,
        data: R,
    ) -> Result<&CentralDirectoryHeader> {
        self.check_state()?;
        let result = self.copy_entry(header, data);
        if result.is_err() {
            self.state = WriterState::Poisoned;
        }
        let central = result?;
        log::trace!(
            "copied entry {:?} ({} bytes)",
            central.decoded_name(),
            central.compressed_size
        );
        self.entries.push(central);
        Ok(&self.entries[self.entries.len() - 1])
    }

    fn copy_entry<R: Read>(
        &mut self,
        header: &CentralDirectoryHeader,
        data: R,
    ) -> Result<CentralDirectoryHeader> {
        let mut central = header.clone();
        central.local_header_offset = self.position()?;
        LocalFileHeader::from_central(&central).write(&mut self.sink)?;

        let copied =
            io::copy(&mut data.take(central.compressed_size), &mut self.sink).map_err(map_io_error)?;
        if copied != central.compressed_size {
            return Err(Error::corrupt_header(
                header.local_header_offset,
                format!(
                    "entry data truncated: {} of {} bytes",
                    copied, central.compressed_size
                ),
            ));
        }

        if central.uses_data_descriptor() {
            DataDescriptor {
                crc32: central.crc32,
                compressed_size: central.compressed_size,
                uncompressed_size: central.uncompressed_size,
            }
            .write(&mut self.sink)?;
        }
        Ok(central)
    }

    /// Writes the central directory and trailing record and returns the sink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFeature`] when the entry count or the
    /// directory position needs ZIP64.
    pub fn finish(mut self, comment: &[u8]) -> Result<W> {
        self.check_state()?;
        let directory_offset = self.position()?;
        for header in &self.entries {
            header.write(&mut self.sink)?;
        }
        let directory_size = self.position()? - directory_offset;
        EndOfCentralDirectory::new(
            self.entries.len(),
            directory_size,
            directory_offset,
            comment.to_vec(),
        )?
        .write(&mut self.sink)?;
        self.sink.flush()?;
        log::debug!(
            "finished archive: {} entries, central directory {} bytes at {:#x}",
            self.entries.len(),
            directory_size,
            directory_offset
        );
        Ok(self.sink)
    }
}
