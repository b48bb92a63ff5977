//! Error types for ZIP archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when working with ZIP archives, along with a convenient
//! [`Result<T>`] type alias and the coarse [`ErrorKind`] classification.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. Every
//! error is reported to the caller of the operation that triggered it; there
//! is no automatic retry.
//!
//! ## Using the `?` Operator
//!
//! ```rust,no_run
//! use zipwright::{Archive, OpenMode, Result};
//!
//! fn read_readme(path: &str) -> Result<Vec<u8>> {
//!     let archive = Archive::open(path, OpenMode::ReadOnly)?;
//!     let index = archive.find("README")?;
//!     archive.open_entry(index, None)?.read_all()
//! }
//! ```
//!
//! ## Matching on the Error Kind
//!
//! Most callers only need to know which family a failure belongs to:
//!
//! ```rust
//! use zipwright::{Error, ErrorKind};
//!
//! fn describe(error: &Error) -> &'static str {
//!     match error.kind() {
//!         ErrorKind::Io => "the file could not be accessed",
//!         ErrorKind::Format => "the file is not a valid ZIP archive",
//!         ErrorKind::NotFound => "no such entry",
//!         ErrorKind::DuplicateName => "an entry with that name already exists",
//!         ErrorKind::Integrity => "the entry is corrupted",
//!         ErrorKind::Authentication => "wrong or missing password",
//!         ErrorKind::Codec => "unsupported or corrupt compressed data",
//!         _ => "the operation failed",
//!     }
//! }
//! ```

use std::io;

/// Helper struct for formatting CrcMismatch error messages.
struct CrcMismatchDisplay<'a> {
    entry_index: Option<usize>,
    entry_name: &'a str,
    expected: u32,
    actual: u32,
}

impl std::fmt::Display for CrcMismatchDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CRC mismatch for entry")?;
        if let Some(index) = self.entry_index {
            write!(f, " {}", index)?;
        }
        write!(
            f,
            " ({}): expected {:#010x}, got {:#010x}",
            self.entry_name, self.expected, self.actual
        )
    }
}

/// Coarse classification of an [`Error`].
///
/// Every error variant belongs to exactly one kind. The kinds mirror the
/// failure families callers usually branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The underlying byte store failed (permissions, missing file, disk full).
    Io,
    /// The container structure is malformed or uses an unsupported feature.
    Format,
    /// A name or index does not resolve to a live entry.
    NotFound,
    /// A name collides with another live entry.
    DuplicateName,
    /// Stored checksums or sizes do not match the data.
    Integrity,
    /// A password is wrong or missing for an encrypted entry.
    Authentication,
    /// A compression method is unsupported or its stream is corrupt.
    Codec,
    /// A staging buffer could not be allocated.
    Allocation,
    /// The caller supplied an unusable argument or the archive refuses changes.
    InvalidArgument,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Io => "I/O error",
            Self::Format => "format error",
            Self::NotFound => "not found",
            Self::DuplicateName => "duplicate name",
            Self::Integrity => "integrity error",
            Self::Authentication => "authentication error",
            Self::Codec => "codec error",
            Self::Allocation => "allocation error",
            Self::InvalidArgument => "invalid argument",
        };
        f.write_str(name)
    }
}

/// The main error type for ZIP archive operations.
///
/// Each variant includes the context needed to diagnose the failure.
///
/// # Error Categories
///
/// | Kind | Variants |
/// |------|----------|
/// | [`Io`][ErrorKind::Io] | [`Io`][Self::Io] |
/// | [`Format`][ErrorKind::Format] | [`InvalidFormat`][Self::InvalidFormat], [`CorruptHeader`][Self::CorruptHeader], [`UnsupportedFeature`][Self::UnsupportedFeature] |
/// | [`NotFound`][ErrorKind::NotFound] | [`EntryNotFound`][Self::EntryNotFound], [`InvalidIndex`][Self::InvalidIndex] |
/// | [`DuplicateName`][ErrorKind::DuplicateName] | [`EntryExists`][Self::EntryExists] |
/// | [`Integrity`][ErrorKind::Integrity] | [`CrcMismatch`][Self::CrcMismatch], [`SizeMismatch`][Self::SizeMismatch] |
/// | [`Authentication`][ErrorKind::Authentication] | [`WrongPassword`][Self::WrongPassword], [`PasswordRequired`][Self::PasswordRequired] |
/// | [`Codec`][ErrorKind::Codec] | [`UnsupportedMethod`][Self::UnsupportedMethod], [`Codec`][Self::Codec] |
/// | [`Allocation`][ErrorKind::Allocation] | [`AllocationFailed`][Self::AllocationFailed] |
/// | [`InvalidArgument`][ErrorKind::InvalidArgument] | [`InvalidEntryName`][Self::InvalidEntryName], [`CommentTooLong`][Self::CommentTooLong], [`InvalidCompressionLevel`][Self::InvalidCompressionLevel], [`ReadOnly`][Self::ReadOnly] |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while accessing the byte store.
    ///
    /// Common causes include a missing archive in [`OpenMode::ReadOnly`],
    /// permission problems, a full disk, or a [`FileSource`] whose file
    /// vanished before commit.
    ///
    /// # Recovery
    ///
    /// ```rust
    /// use zipwright::Error;
    /// use std::io::ErrorKind;
    ///
    /// fn handle_io_error(error: &Error) {
    ///     if let Error::Io(e) = error {
    ///         match e.kind() {
    ///             ErrorKind::NotFound => println!("File not found"),
    ///             ErrorKind::PermissionDenied => println!("Access denied"),
    ///             _ => println!("I/O error: {}", e),
    ///         }
    ///     }
    /// }
    /// ```
    ///
    /// [`OpenMode::ReadOnly`]: crate::OpenMode::ReadOnly
    /// [`FileSource`]: crate::FileSource
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The data is not a ZIP archive.
    ///
    /// Returned when no end-of-central-directory record can be located or
    /// when the trailing record contradicts the file size.
    #[error("Invalid ZIP format: {0}")]
    InvalidFormat(String),

    /// A header record is corrupt or truncated.
    ///
    /// The offset points at the record that failed to parse.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// The archive needs a container feature this crate does not implement.
    #[error("Unsupported feature: {feature}")]
    UnsupportedFeature {
        /// The name of the unsupported feature.
        feature: &'static str,
    },

    /// No live entry has the given name.
    #[error("Entry not found: {name}")]
    EntryNotFound {
        /// The name that was looked up.
        name: String,
    },

    /// The index does not refer to a live entry.
    #[error("Invalid entry index: {index}")]
    InvalidIndex {
        /// The index that was used.
        index: usize,
    },

    /// Another live entry already uses the name.
    #[error("Entry already exists: {name}")]
    EntryExists {
        /// The colliding name.
        name: String,
    },

    /// The CRC-32 of the decompressed data differs from the stored value.
    #[error("{}", CrcMismatchDisplay { entry_index: *entry_index, entry_name, expected: *expected, actual: *actual })]
    CrcMismatch {
        /// The entry index, when the entry is addressed by index.
        entry_index: Option<usize>,
        /// The entry name.
        entry_name: String,
        /// The CRC stored in the central directory.
        expected: u32,
        /// The CRC computed over the data.
        actual: u32,
    },

    /// Decompression produced a different number of bytes than recorded.
    #[error("Size mismatch for entry {entry_name}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// The entry name.
        entry_name: String,
        /// The uncompressed size stored in the central directory.
        expected: u64,
        /// The number of bytes produced (or a lower bound when too many).
        actual: u64,
    },

    /// The password does not decrypt the entry.
    ///
    /// Detected by the check byte at the end of the 12-byte encryption header.
    ///
    /// # Recovery
    ///
    /// Retry with another password, either per call or via
    /// [`Archive::set_default_password`](crate::Archive::set_default_password).
    #[error("Wrong password for entry {entry_name}")]
    WrongPassword {
        /// The entry that failed to decrypt.
        entry_name: String,
    },

    /// The entry is encrypted and no password was supplied.
    #[error("Password required for encrypted entry {entry_name}")]
    PasswordRequired {
        /// The encrypted entry.
        entry_name: String,
    },

    /// The compression method is not supported.
    ///
    /// Only Stored (0) and Deflate (8) are available.
    #[error("Unsupported compression method: {method_id}")]
    UnsupportedMethod {
        /// The method ID from the header.
        method_id: u16,
    },

    /// The compressed stream is corrupt.
    #[error("Codec error (method {method_id}): {reason}")]
    Codec {
        /// The method ID of the failing codec.
        method_id: u16,
        /// The codec's own diagnostic.
        reason: String,
    },

    /// A staging buffer could not be allocated.
    #[error("Failed to allocate {bytes} bytes")]
    AllocationFailed {
        /// The requested size.
        bytes: u64,
    },

    /// An entry name is not acceptable.
    ///
    /// Names must be non-empty, free of NUL bytes and shorter than 64 KiB.
    #[error("Invalid entry name: {0}")]
    InvalidEntryName(String),

    /// A comment does not fit the 16-bit length field of its record.
    #[error("Comment too long: {len} bytes (maximum 65535)")]
    CommentTooLong {
        /// Length of the rejected comment in bytes.
        len: usize,
    },

    /// An invalid compression level was specified.
    ///
    /// Deflate levels range from 0 (fastest) to 9 (best).
    #[error("invalid compression level {level}: must be 0-9")]
    InvalidCompressionLevel {
        /// The invalid level that was provided.
        level: u32,
    },

    /// The archive was opened read-only or carries the read-only flag.
    #[error("Archive is read-only")]
    ReadOnly,
}

impl Error {
    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::InvalidFormat(_)
            | Error::CorruptHeader { .. }
            | Error::UnsupportedFeature { .. } => ErrorKind::Format,
            Error::EntryNotFound { .. } | Error::InvalidIndex { .. } => ErrorKind::NotFound,
            Error::EntryExists { .. } => ErrorKind::DuplicateName,
            Error::CrcMismatch { .. } | Error::SizeMismatch { .. } => ErrorKind::Integrity,
            Error::WrongPassword { .. } | Error::PasswordRequired { .. } => {
                ErrorKind::Authentication
            }
            Error::UnsupportedMethod { .. } | Error::Codec { .. } => ErrorKind::Codec,
            Error::AllocationFailed { .. } => ErrorKind::Allocation,
            Error::InvalidEntryName(_)
            | Error::CommentTooLong { .. }
            | Error::InvalidCompressionLevel { .. }
            | Error::ReadOnly => ErrorKind::InvalidArgument,
        }
    }

    /// Returns `true` if this is a data corruption error.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::CrcMismatch { .. } | Error::SizeMismatch { .. } | Error::CorruptHeader { .. }
        )
    }

    /// Returns `true` if this is an encryption-related error.
    pub fn is_encryption_error(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }

    /// Returns the entry name associated with this error, if any.
    ///
    /// # Example
    ///
    /// ```rust
    /// use zipwright::Error;
    ///
    /// fn log_error(error: &Error) {
    ///     if let Some(name) = error.entry_name() {
    ///         eprintln!("Error for '{}': {}", name, error);
    ///     }
    /// }
    /// ```
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Error::EntryNotFound { name } | Error::EntryExists { name } => Some(name),
            Error::CrcMismatch { entry_name, .. }
            | Error::SizeMismatch { entry_name, .. }
            | Error::WrongPassword { entry_name }
            | Error::PasswordRequired { entry_name } => Some(entry_name),
            _ => None,
        }
    }

    /// Creates a CorruptHeader error.
    pub fn corrupt_header(offset: u64, reason: impl Into<String>) -> Self {
        Error::CorruptHeader {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates a CrcMismatch error.
    pub fn crc_mismatch(
        entry_index: Option<usize>,
        entry_name: impl Into<String>,
        expected: u32,
        actual: u32,
    ) -> Self {
        Error::CrcMismatch {
            entry_index,
            entry_name: entry_name.into(),
            expected,
            actual,
        }
    }

    /// Wraps this error in an [`io::Error`] so it can travel through `Read`.
    ///
    /// [`map_io_error`] recovers the typed error on the other side.
    pub(crate) fn into_io(self) -> io::Error {
        match self {
            Error::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

/// Converts an I/O error back into a typed error if it carries one.
pub(crate) fn map_io_error(e: io::Error) -> Error {
    if e.get_ref().is_some_and(|inner| inner.is::<Error>()) {
        if let Some(inner) = e.into_inner() {
            if let Ok(err) = inner.downcast::<Error>() {
                return *err;
            }
        }
        return Error::InvalidFormat("lost error context".into());
    }
    Error::Io(e)
}

/// A specialized Result type for ZIP operations.
///
/// # Example
///
/// ```rust
/// use zipwright::Result;
///
/// fn my_function() -> Result<()> {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;
