//! End of central directory record and its backward search.

use std::io::Write;

use super::reader::{u16_at, u32_at, write_u16_le, write_u32_le};
use super::{
    EOCD_SIGNATURE, EOCD_SIZE, MAX_COMMENT_LENGTH, MAX_ZIP32_ENTRIES, MAX_ZIP32_VALUE,
    ZIP64_LOCATOR_SIGNATURE,
};
use crate::store::ReadAt;
use crate::{Error, Result};

/// Size of the ZIP64 end of central directory locator.
const ZIP64_LOCATOR_SIZE: u64 = 20;

/// The end of central directory record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndOfCentralDirectory {
    /// Number of this disk.
    pub disk_number: u16,
    /// Disk where the central directory starts.
    pub central_directory_disk: u16,
    /// Number of central directory entries on this disk.
    pub entries_on_disk: u16,
    /// Total number of central directory entries.
    pub total_entries: u16,
    /// Size of the central directory in bytes.
    pub central_directory_size: u32,
    /// Offset of the central directory from the start of the archive.
    pub central_directory_offset: u32,
    /// Archive comment.
    pub comment: Vec<u8>,
}

impl EndOfCentralDirectory {
    /// Builds a single-disk record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFeature`] when the values need ZIP64.
    pub fn new(entries: usize, size: u64, offset: u64, comment: Vec<u8>) -> Result<Self> {
        if entries > MAX_ZIP32_ENTRIES || size > MAX_ZIP32_VALUE || offset > MAX_ZIP32_VALUE {
            return Err(Error::UnsupportedFeature {
                feature: "ZIP64 (more than 65534 entries or central directory above 4 GiB)",
            });
        }
        if comment.len() > MAX_COMMENT_LENGTH {
            return Err(Error::InvalidFormat(format!(
                "archive comment longer than {} bytes",
                MAX_COMMENT_LENGTH
            )));
        }
        Ok(Self {
            disk_number: 0,
            central_directory_disk: 0,
            entries_on_disk: entries as u16,
            total_entries: entries as u16,
            central_directory_size: size as u32,
            central_directory_offset: offset as u32,
            comment,
        })
    }

    /// Parses the fixed part of the record plus `comment`.
    ///
    /// The caller guarantees `bytes.len() >= 22`.
    fn from_bytes(bytes: &[u8], comment: Vec<u8>) -> Self {
        Self {
            disk_number: u16_at(bytes, 4),
            central_directory_disk: u16_at(bytes, 6),
            entries_on_disk: u16_at(bytes, 8),
            total_entries: u16_at(bytes, 10),
            central_directory_size: u32_at(bytes, 12),
            central_directory_offset: u32_at(bytes, 16),
            comment,
        }
    }

    /// Returns `true` if any field holds a ZIP64 sentinel.
    pub fn is_zip64(&self) -> bool {
        self.total_entries == 0xFFFF
            || self.entries_on_disk == 0xFFFF
            || self.central_directory_size == 0xFFFF_FFFF
            || self.central_directory_offset == 0xFFFF_FFFF
    }

    /// Returns `true` if the archive spans several disks.
    pub fn is_multi_disk(&self) -> bool {
        self.disk_number != 0
            || self.central_directory_disk != 0
            || self.entries_on_disk != self.total_entries
    }

    /// Serializes the record.
    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        write_u32_le(w, EOCD_SIGNATURE)?;
        write_u16_le(w, self.disk_number)?;
        write_u16_le(w, self.central_directory_disk)?;
        write_u16_le(w, self.entries_on_disk)?;
        write_u16_le(w, self.total_entries)?;
        write_u32_le(w, self.central_directory_size)?;
        write_u32_le(w, self.central_directory_offset)?;
        write_u16_le(w, self.comment.len() as u16)?;
        w.write_all(&self.comment)?;
        Ok(())
    }
}

/// Locates and parses the end of central directory record.
///
/// Returns the record and its offset. The record usually sits in the last
/// 22 bytes; with an archive comment it is found by scanning backwards over
/// at most 65535 + 22 bytes. A candidate is accepted only if its comment
/// length reaches exactly the end of the data; when none does (trailing
/// garbage), the candidate closest to the end wins.
///
/// # Errors
///
/// - [`Error::InvalidFormat`] if no record exists
/// - [`Error::UnsupportedFeature`] for ZIP64 or multi-disk archives
pub fn find_eocd<S: ReadAt + ?Sized>(store: &S, size: u64) -> Result<(EndOfCentralDirectory, u64)> {
    if size < EOCD_SIZE {
        return Err(Error::InvalidFormat(format!(
            "{} bytes is too short for an end of central directory record",
            size
        )));
    }

    let search_size = (MAX_COMMENT_LENGTH as u64 + EOCD_SIZE).min(size);
    let search_start = size - search_size;
    let mut buf = vec![0u8; search_size as usize];
    store.read_exact_at(search_start, &mut buf)?;

    let signature = EOCD_SIGNATURE.to_le_bytes();
    let last_start = buf.len() - EOCD_SIZE as usize;
    let mut fallback = None;
    for i in (0..=last_start).rev() {
        if buf[i..i + 4] != signature {
            continue;
        }
        let comment_len = u16_at(&buf, i + 20) as usize;
        let comment_start = i + EOCD_SIZE as usize;
        let remaining = buf.len() - comment_start;
        if comment_len == remaining {
            let record = EndOfCentralDirectory::from_bytes(&buf[i..], buf[comment_start..].to_vec());
            return validate(store, record, search_start + i as u64);
        }
        if fallback.is_none() && comment_len < remaining {
            fallback = Some((i, comment_len));
        }
    }

    if let Some((i, comment_len)) = fallback {
        let comment_start = i + EOCD_SIZE as usize;
        log::warn!(
            "end of central directory record at {:#x} is followed by {} unexpected bytes",
            search_start + i as u64,
            buf.len() - comment_start - comment_len
        );
        let comment = buf[comment_start..comment_start + comment_len].to_vec();
        let record = EndOfCentralDirectory::from_bytes(&buf[i..], comment);
        return validate(store, record, search_start + i as u64);
    }

    Err(Error::InvalidFormat(
        "end of central directory signature not found".into(),
    ))
}

fn validate<S: ReadAt + ?Sized>(
    store: &S,
    record: EndOfCentralDirectory,
    offset: u64,
) -> Result<(EndOfCentralDirectory, u64)> {
    if record.is_multi_disk() {
        return Err(Error::UnsupportedFeature {
            feature: "multi-disk archives",
        });
    }
    if record.is_zip64() || has_zip64_locator(store, offset)? {
        return Err(Error::UnsupportedFeature { feature: "ZIP64" });
    }
    let directory_end =
        record.central_directory_offset as u64 + record.central_directory_size as u64;
    if record.central_directory_size as u64 > offset {
        return Err(Error::corrupt_header(
            offset,
            format!(
                "central directory size {} exceeds its available space",
                record.central_directory_size
            ),
        ));
    }
    if directory_end > offset {
        return Err(Error::corrupt_header(
            offset,
            format!(
                "central directory ends at {:#x}, past the trailing record",
                directory_end
            ),
        ));
    }
    Ok((record, offset))
}

fn has_zip64_locator<S: ReadAt + ?Sized>(store: &S, eocd_offset: u64) -> Result<bool> {
    if eocd_offset < ZIP64_LOCATOR_SIZE {
        return Ok(false);
    }
    let mut sig = [0u8; 4];
    store.read_exact_at(eocd_offset - ZIP64_LOCATOR_SIZE, &mut sig)?;
    Ok(u32::from_le_bytes(sig) == ZIP64_LOCATOR_SIGNATURE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(record: &EndOfCentralDirectory) -> Vec<u8> {
        let mut buf = Vec::new();
        record.write(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_empty_archive() {
        let record = EndOfCentralDirectory::new(0, 0, 0, Vec::new()).unwrap();
        let bytes = encoded(&record);
        assert_eq!(bytes.len(), 22);
        assert_eq!(&bytes[..4], b"PK\x05\x06");

        let (found, offset) = find_eocd(bytes.as_slice(), bytes.len() as u64).unwrap();
        assert_eq!(found, record);
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_record_with_comment() {
        let mut bytes = vec![0u8; 100];
        let record = EndOfCentralDirectory::new(0, 0, 100, b"hello PK\x05\x06 world".to_vec()).unwrap();
        bytes.extend(encoded(&record));
        let (found, offset) = find_eocd(bytes.as_slice(), bytes.len() as u64).unwrap();
        assert_eq!(offset, 100);
        assert_eq!(found.comment, b"hello PK\x05\x06 world");
    }

    #[test]
    fn test_trailing_garbage_falls_back() {
        let record = EndOfCentralDirectory::new(0, 0, 0, b"c".to_vec()).unwrap();
        let mut bytes = encoded(&record);
        bytes.extend_from_slice(b"junk");
        let (found, offset) = find_eocd(bytes.as_slice(), bytes.len() as u64).unwrap();
        assert_eq!(offset, 0);
        assert_eq!(found.comment, b"c");
    }

    #[test]
    fn test_missing_signature() {
        let bytes = b"this is definitely not a zip archive".to_vec();
        let err = find_eocd(bytes.as_slice(), bytes.len() as u64).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_too_short() {
        let err = find_eocd(&b"PK"[..], 2).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_zip64_rejected() {
        let mut record = EndOfCentralDirectory::new(0, 0, 0, Vec::new()).unwrap();
        record.total_entries = 0xFFFF;
        record.entries_on_disk = 0xFFFF;
        let bytes = encoded(&record);
        let err = find_eocd(bytes.as_slice(), bytes.len() as u64).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature { feature: "ZIP64" }));
    }

    #[test]
    fn test_directory_past_record_is_corrupt() {
        let record = EndOfCentralDirectory::new(1, 46, 10, Vec::new()).unwrap();
        let bytes = encoded(&record);
        let err = find_eocd(bytes.as_slice(), bytes.len() as u64).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_new_rejects_zip64_counts() {
        assert!(EndOfCentralDirectory::new(70_000, 0, 0, Vec::new()).is_err());
        assert!(EndOfCentralDirectory::new(1, 0, 1 << 33, Vec::new()).is_err());
    }
}
