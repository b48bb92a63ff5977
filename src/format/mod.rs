//! ZIP container constants, record definitions, and low-level parsing.
//!
//! A ZIP file is laid out as:
//!
//! ```text
//! [local file header 1][data 1][data descriptor 1]?
//! ...
//! [local file header n][data n][data descriptor n]?
//! [central directory header 1] ... [central directory header n]
//! [end of central directory record]
//! ```
//!
//! The central directory is authoritative; local headers are only consulted
//! to find where an entry's data starts.

pub(crate) mod cp437;
pub mod eocd;
pub mod header;
pub mod reader;

pub use eocd::{EndOfCentralDirectory, find_eocd};
pub use header::{CentralDirectoryHeader, DataDescriptor, LocalFileHeader};

/// Signature of a local file header (`PK\x03\x04`).
pub const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x0403_4b50;

/// Signature of a central directory header (`PK\x01\x02`).
pub const CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0201_4b50;

/// Signature of the end of central directory record (`PK\x05\x06`).
pub const EOCD_SIGNATURE: u32 = 0x0605_4b50;

/// Optional signature preceding a data descriptor (`PK\x07\x08`).
pub const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x0807_4b50;

/// Signature of the ZIP64 end of central directory locator (`PK\x06\x07`).
pub const ZIP64_LOCATOR_SIGNATURE: u32 = 0x0706_4b50;

/// Fixed size of a local file header, before name and extra field.
pub const LOCAL_FILE_HEADER_SIZE: u64 = 30;

/// Fixed size of a central directory header, before variable fields.
pub const CENTRAL_DIRECTORY_HEADER_SIZE: u64 = 46;

/// Fixed size of the end of central directory record, before the comment.
pub const EOCD_SIZE: u64 = 22;

/// Maximum length of the archive comment.
pub const MAX_COMMENT_LENGTH: usize = u16::MAX as usize;

/// Version needed to extract: 2.0 (Deflate, directories, encryption).
pub const VERSION_NEEDED: u16 = 20;

/// Version made by: 2.0, host system 3 (Unix).
pub const VERSION_MADE_BY: u16 = (3 << 8) | 20;

/// Largest value a 32-bit size or offset field may carry before ZIP64.
pub const MAX_ZIP32_VALUE: u64 = 0xFFFF_FFFE;

/// Largest entry count the classic trailing record can describe.
pub const MAX_ZIP32_ENTRIES: usize = 0xFFFE;

/// General purpose flag bits.
pub mod flags {
    /// The entry is encrypted.
    pub const ENCRYPTED: u16 = 1 << 0;
    /// CRC and sizes follow the data in a data descriptor.
    pub const DATA_DESCRIPTOR: u16 = 1 << 3;
    /// Strong encryption (not supported).
    pub const STRONG_ENCRYPTION: u16 = 1 << 6;
    /// Name and comment are UTF-8.
    pub const UTF8: u16 = 1 << 11;
    /// Local header values are masked (not supported).
    pub const MASKED_HEADER: u16 = 1 << 13;
}

/// External attribute bit marking an MS-DOS directory.
pub const DOS_DIRECTORY_ATTRIBUTE: u32 = 0x10;

/// Unix mode for regular files written by this crate (`-rw-r--r--`).
pub const UNIX_FILE_MODE: u32 = 0o100644;

/// Unix mode for directories written by this crate (`drwxr-xr-x`).
pub const UNIX_DIRECTORY_MODE: u32 = 0o040755;
