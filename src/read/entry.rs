//! Entry metadata snapshots.

use crate::codec::CompressionMethod;
use crate::directory::EntryRecord;
use crate::timestamp::DosDateTime;

/// A snapshot of one live entry.
///
/// Reflects uncommitted renames, replacements and comments. While an
/// entry's bytes come from a pending source, `is_pending` is set: `size` is
/// the source's length hint (0 when unknown) and `compressed_size` and
/// `crc32` are 0 until commit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct EntryMetadata {
    /// Slot index of the entry.
    pub index: usize,
    /// Entry name.
    pub name: String,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Compressed size in bytes, including any encryption header.
    pub compressed_size: u64,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Compression method.
    pub method: CompressionMethod,
    /// Last modification time.
    pub modified: DosDateTime,
    /// Entry comment; empty when there is none.
    pub comment: String,
    /// Whether the data is encrypted.
    pub is_encrypted: bool,
    /// Whether this is a directory entry.
    pub is_directory: bool,
    /// Whether the bytes come from an uncommitted source.
    pub is_pending: bool,
}

impl EntryMetadata {
    pub(crate) fn from_record(index: usize, record: &EntryRecord, is_pending: bool) -> Self {
        let header = &record.header;
        Self {
            index,
            name: record.name.clone(),
            size: header.uncompressed_size,
            compressed_size: header.compressed_size,
            crc32: header.crc32,
            method: CompressionMethod::from_u16(header.method),
            modified: header.modified,
            comment: record.comment().into_owned(),
            is_encrypted: header.is_encrypted(),
            is_directory: header.is_directory(),
            is_pending,
        }
    }

    /// Returns `true` for regular file entries.
    pub fn is_file(&self) -> bool {
        !self.is_directory
    }

    /// Returns the compression ratio (compressed / uncompressed).
    pub fn compression_ratio(&self) -> f64 {
        if self.size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.size as f64
        }
    }
}
