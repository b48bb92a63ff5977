//! Local file header, central directory header and data descriptor records.

use std::borrow::Cow;
use std::io::{Read, Write};

use super::cp437;
use super::reader::{read_bytes, read_u16_le, read_u32_le, write_u16_le, write_u32_le};
use super::{
    CENTRAL_DIRECTORY_HEADER_SIZE, CENTRAL_DIRECTORY_SIGNATURE, DATA_DESCRIPTOR_SIGNATURE,
    LOCAL_FILE_HEADER_SIGNATURE, LOCAL_FILE_HEADER_SIZE, MAX_ZIP32_VALUE, flags,
};
use crate::timestamp::DosDateTime;
use crate::{Error, Result};

/// Value of a 32-bit field that defers to a ZIP64 extra field.
const ZIP64_SENTINEL: u32 = 0xFFFF_FFFF;

/// Decodes a name or comment.
///
/// Valid UTF-8 is borrowed as is; anything else is read as CP437.
pub(crate) fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(cp437::decode(bytes)),
    }
}

fn zip32(value: u64) -> Result<u32> {
    if value > MAX_ZIP32_VALUE {
        return Err(Error::UnsupportedFeature {
            feature: "ZIP64 (sizes or offsets above 4 GiB)",
        });
    }
    Ok(value as u32)
}

fn length16(len: usize, what: &'static str) -> Result<u16> {
    u16::try_from(len).map_err(|_| Error::InvalidEntryName(format!("{} longer than 65535 bytes", what)))
}

/// A central directory file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    /// Version made by (high byte: host system).
    pub version_made_by: u16,
    /// Minimum version needed to extract.
    pub version_needed: u16,
    /// General purpose bit flags.
    pub flags: u16,
    /// Compression method ID.
    pub method: u16,
    /// Last modification time.
    pub modified: DosDateTime,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Size of the stored data, including any encryption header.
    pub compressed_size: u64,
    /// Size of the uncompressed data.
    pub uncompressed_size: u64,
    /// Disk number where the entry starts.
    pub disk_start: u16,
    /// Internal file attributes.
    pub internal_attributes: u16,
    /// External file attributes (host-dependent).
    pub external_attributes: u32,
    /// Offset of the local file header.
    pub local_header_offset: u64,
    /// Raw name bytes.
    pub name: Vec<u8>,
    /// Raw extra field.
    pub extra: Vec<u8>,
    /// Raw comment bytes.
    pub comment: Vec<u8>,
}

impl CentralDirectoryHeader {
    /// Parses one header. `offset` is only used for error reporting.
    pub fn parse<R: Read>(r: &mut R, offset: u64) -> Result<Self> {
        let signature = read_u32_le(r).map_err(|e| truncated(offset, e))?;
        if signature != CENTRAL_DIRECTORY_SIGNATURE {
            return Err(Error::corrupt_header(
                offset,
                format!("expected central directory signature, found {:#010x}", signature),
            ));
        }
        Self::parse_body(r, offset).map_err(|e| match e {
            Error::Io(e) => truncated(offset, e),
            other => other,
        })
    }

    fn parse_body<R: Read>(r: &mut R, offset: u64) -> Result<Self> {
        let version_made_by = read_u16_le(r)?;
        let version_needed = read_u16_le(r)?;
        let flags = read_u16_le(r)?;
        let method = read_u16_le(r)?;
        let time = read_u16_le(r)?;
        let date = read_u16_le(r)?;
        let crc32 = read_u32_le(r)?;
        let compressed_size = read_u32_le(r)?;
        let uncompressed_size = read_u32_le(r)?;
        let name_len = read_u16_le(r)?;
        let extra_len = read_u16_le(r)?;
        let comment_len = read_u16_le(r)?;
        let disk_start = read_u16_le(r)?;
        let internal_attributes = read_u16_le(r)?;
        let external_attributes = read_u32_le(r)?;
        let local_header_offset = read_u32_le(r)?;
        let name = read_bytes(r, name_len as usize)?;
        let extra = read_bytes(r, extra_len as usize)?;
        let comment = read_bytes(r, comment_len as usize)?;

        if [compressed_size, uncompressed_size, local_header_offset].contains(&ZIP64_SENTINEL)
            || disk_start == 0xFFFF
        {
            log::debug!("central directory header at {:#x} defers to ZIP64", offset);
            return Err(Error::UnsupportedFeature { feature: "ZIP64" });
        }

        Ok(Self {
            version_made_by,
            version_needed,
            flags,
            method,
            modified: DosDateTime::from_parts(date, time),
            crc32,
            compressed_size: compressed_size as u64,
            uncompressed_size: uncompressed_size as u64,
            disk_start,
            internal_attributes,
            external_attributes,
            local_header_offset: local_header_offset as u64,
            name,
            extra,
            comment,
        })
    }

    /// Serializes the header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFeature`] if a size or offset needs ZIP64.
    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        let compressed_size = zip32(self.compressed_size)?;
        let uncompressed_size = zip32(self.uncompressed_size)?;
        let local_header_offset = zip32(self.local_header_offset)?;
        let name_len = length16(self.name.len(), "name")?;
        let extra_len = length16(self.extra.len(), "extra field")?;
        let comment_len = length16(self.comment.len(), "comment")?;

        write_u32_le(w, CENTRAL_DIRECTORY_SIGNATURE)?;
        write_u16_le(w, self.version_made_by)?;
        write_u16_le(w, self.version_needed)?;
        write_u16_le(w, self.flags)?;
        write_u16_le(w, self.method)?;
        write_u16_le(w, self.modified.time_word())?;
        write_u16_le(w, self.modified.date_word())?;
        write_u32_le(w, self.crc32)?;
        write_u32_le(w, compressed_size)?;
        write_u32_le(w, uncompressed_size)?;
        write_u16_le(w, name_len)?;
        write_u16_le(w, extra_len)?;
        write_u16_le(w, comment_len)?;
        write_u16_le(w, self.disk_start)?;
        write_u16_le(w, self.internal_attributes)?;
        write_u32_le(w, self.external_attributes)?;
        write_u32_le(w, local_header_offset)?;
        w.write_all(&self.name)?;
        w.write_all(&self.extra)?;
        w.write_all(&self.comment)?;
        Ok(())
    }

    /// Size of the serialized header.
    pub fn encoded_len(&self) -> u64 {
        CENTRAL_DIRECTORY_HEADER_SIZE
            + self.name.len() as u64
            + self.extra.len() as u64
            + self.comment.len() as u64
    }

    /// Returns `true` if the entry data is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.flags & flags::ENCRYPTED != 0
    }

    /// Returns `true` if a data descriptor follows the entry data.
    pub fn uses_data_descriptor(&self) -> bool {
        self.flags & flags::DATA_DESCRIPTOR != 0
    }

    /// Returns the decoded name.
    pub fn decoded_name(&self) -> Cow<'_, str> {
        decode_text(&self.name)
    }

    /// Returns `true` if the entry is a directory.
    pub fn is_directory(&self) -> bool {
        self.name.last() == Some(&b'/')
    }
}

/// A local file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    /// Minimum version needed to extract.
    pub version_needed: u16,
    /// General purpose bit flags.
    pub flags: u16,
    /// Compression method ID.
    pub method: u16,
    /// Last modification time.
    pub modified: DosDateTime,
    /// CRC-32, zero when a data descriptor follows.
    pub crc32: u32,
    /// Stored size, zero when a data descriptor follows.
    pub compressed_size: u64,
    /// Uncompressed size, zero when a data descriptor follows.
    pub uncompressed_size: u64,
    /// Raw name bytes.
    pub name: Vec<u8>,
    /// Raw extra field.
    pub extra: Vec<u8>,
}

impl LocalFileHeader {
    /// Byte offset of the CRC field, used to patch sizes after streaming.
    pub const CRC_FIELD_OFFSET: u64 = 14;

    /// Builds the local header matching a central directory header.
    ///
    /// With a data descriptor the CRC and sizes are left zero. The extra
    /// field is not carried over.
    pub fn from_central(central: &CentralDirectoryHeader) -> Self {
        let deferred = central.uses_data_descriptor();
        Self {
            version_needed: central.version_needed,
            flags: central.flags,
            method: central.method,
            modified: central.modified,
            crc32: if deferred { 0 } else { central.crc32 },
            compressed_size: if deferred { 0 } else { central.compressed_size },
            uncompressed_size: if deferred {
                0
            } else {
                central.uncompressed_size
            },
            name: central.name.clone(),
            extra: Vec::new(),
        }
    }

    /// Parses a local header. `offset` is only used for error reporting.
    pub fn parse<R: Read>(r: &mut R, offset: u64) -> Result<Self> {
        let signature = read_u32_le(r).map_err(|e| truncated(offset, e))?;
        if signature != LOCAL_FILE_HEADER_SIGNATURE {
            return Err(Error::corrupt_header(
                offset,
                format!("expected local file header signature, found {:#010x}", signature),
            ));
        }
        Self::parse_body(r).map_err(|e| truncated(offset, e))
    }

    fn parse_body<R: Read>(r: &mut R) -> std::io::Result<Self> {
        let version_needed = read_u16_le(r)?;
        let flags = read_u16_le(r)?;
        let method = read_u16_le(r)?;
        let time = read_u16_le(r)?;
        let date = read_u16_le(r)?;
        let crc32 = read_u32_le(r)?;
        let compressed_size = read_u32_le(r)?;
        let uncompressed_size = read_u32_le(r)?;
        let name_len = read_u16_le(r)?;
        let extra_len = read_u16_le(r)?;
        let name = read_bytes(r, name_len as usize)?;
        let extra = read_bytes(r, extra_len as usize)?;
        Ok(Self {
            version_needed,
            flags,
            method,
            modified: DosDateTime::from_parts(date, time),
            crc32,
            compressed_size: compressed_size as u64,
            uncompressed_size: uncompressed_size as u64,
            name,
            extra,
        })
    }

    /// Serializes the header.
    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        let compressed_size = zip32(self.compressed_size)?;
        let uncompressed_size = zip32(self.uncompressed_size)?;
        let name_len = length16(self.name.len(), "name")?;
        let extra_len = length16(self.extra.len(), "extra field")?;

        write_u32_le(w, LOCAL_FILE_HEADER_SIGNATURE)?;
        write_u16_le(w, self.version_needed)?;
        write_u16_le(w, self.flags)?;
        write_u16_le(w, self.method)?;
        write_u16_le(w, self.modified.time_word())?;
        write_u16_le(w, self.modified.date_word())?;
        write_u32_le(w, self.crc32)?;
        write_u32_le(w, compressed_size)?;
        write_u32_le(w, uncompressed_size)?;
        write_u16_le(w, name_len)?;
        write_u16_le(w, extra_len)?;
        w.write_all(&self.name)?;
        w.write_all(&self.extra)?;
        Ok(())
    }

    /// Size of the serialized header; entry data starts right after it.
    pub fn encoded_len(&self) -> u64 {
        LOCAL_FILE_HEADER_SIZE + self.name.len() as u64 + self.extra.len() as u64
    }
}

/// The CRC and sizes written after entry data when bit 3 is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataDescriptor {
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Stored size.
    pub compressed_size: u64,
    /// Uncompressed size.
    pub uncompressed_size: u64,
}

impl DataDescriptor {
    /// Serializes the descriptor, including the optional signature.
    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        write_u32_le(w, DATA_DESCRIPTOR_SIGNATURE)?;
        write_u32_le(w, self.crc32)?;
        write_u32_le(w, zip32(self.compressed_size)?)?;
        write_u32_le(w, zip32(self.uncompressed_size)?)?;
        Ok(())
    }
}

fn truncated(offset: u64, e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::corrupt_header(offset, "truncated header")
    } else {
        Error::Io(e)
    }
}
