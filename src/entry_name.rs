//! Entry name type with validation for names written into an archive.

use crate::{Error, Result};
use std::fmt;

/// Maximum length of an entry name in bytes.
///
/// The file name length fields in ZIP headers are 16 bits wide.
pub const MAX_NAME_LENGTH: usize = u16::MAX as usize;

/// A validated name for a new or renamed archive entry.
///
/// ZIP names use `/` as the separator; a trailing `/` marks a directory.
/// `EntryName` validates that:
/// - The name is not empty and contains no NUL bytes
/// - The name fits the 16-bit length field
/// - The name is not absolute (does not start with `/`)
/// - No empty segments exist except the directory marker
/// - No `.` or `..` segments are present
///
/// Names of entries read from existing archives are never validated; the
/// rules apply only to names this crate writes.
///
/// # Examples
///
/// ```
/// use zipwright::EntryName;
///
/// let name = EntryName::new("doc/REFMAN").unwrap();
/// assert_eq!(name.as_str(), "doc/REFMAN");
/// assert!(!name.is_directory());
///
/// let dir = EntryName::directory("doc").unwrap();
/// assert_eq!(dir.as_str(), "doc/");
/// assert!(dir.is_directory());
///
/// assert!(EntryName::new("../secret").is_err());
/// assert!(EntryName::new("/absolute").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryName(String);

impl EntryName {
    /// Creates a new `EntryName`, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEntryName`] if any rule above is violated.
    pub fn new(s: &str) -> Result<Self> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Creates a directory name, appending the trailing `/` when missing.
    pub fn directory(s: &str) -> Result<Self> {
        if s.ends_with('/') {
            Self::new(s)
        } else {
            Self::new(&format!("{}/", s))
        }
    }

    fn validate(s: &str) -> Result<()> {
        if s.is_empty() {
            return Err(Error::InvalidEntryName("empty name".into()));
        }
        if s.contains('\0') {
            return Err(Error::InvalidEntryName("contains NUL byte".into()));
        }
        if s.len() > MAX_NAME_LENGTH {
            return Err(Error::InvalidEntryName(format!(
                "name exceeds maximum length of {} bytes",
                MAX_NAME_LENGTH
            )));
        }
        if s.starts_with('/') {
            return Err(Error::InvalidEntryName("absolute name not allowed".into()));
        }

        let body = s.strip_suffix('/').unwrap_or(s);
        for segment in body.split('/') {
            match segment {
                "" => {
                    return Err(Error::InvalidEntryName(
                        "empty segment (consecutive slashes)".into(),
                    ));
                }
                "." => return Err(Error::InvalidEntryName("'.' segment not allowed".into())),
                ".." => {
                    return Err(Error::InvalidEntryName(
                        "'..' segment not allowed (path traversal)".into(),
                    ));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Returns the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the name denotes a directory.
    pub fn is_directory(&self) -> bool {
        self.0.ends_with('/')
    }

    /// Returns the last segment of the name, without a directory marker.
    pub fn file_name(&self) -> &str {
        let body = self.0.strip_suffix('/').unwrap_or(&self.0);
        body.rsplit('/').next().unwrap_or(body)
    }

    /// Consumes the name and returns the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for EntryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for EntryName {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for EntryName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_simple_file() {
        let name = EntryName::new("README").unwrap();
        assert_eq!(name.as_str(), "README");
        assert_eq!(name.file_name(), "README");
    }

    #[test]
    fn test_valid_nested() {
        let name = EntryName::new("doc/REFMAN").unwrap();
        assert_eq!(name.file_name(), "REFMAN");
    }

    #[test]
    fn test_valid_unicode() {
        let name = EntryName::new("日本語/файл.txt").unwrap();
        assert_eq!(name.as_str(), "日本語/файл.txt");
    }

    #[test]
    fn test_directory_marker() {
        let dir = EntryName::new("doc/").unwrap();
        assert!(dir.is_directory());
        assert_eq!(dir.file_name(), "doc");
        assert_eq!(EntryName::directory("doc/").unwrap(), dir);
    }

    #[test]
    fn test_invalid_empty() {
        let err = EntryName::new("").unwrap_err();
        assert!(matches!(err, Error::InvalidEntryName(_)));
    }

    #[test]
    fn test_invalid_nul_byte() {
        let err = EntryName::new("file\0.txt").unwrap_err();
        assert!(err.to_string().contains("NUL"));
    }

    #[test]
    fn test_invalid_absolute() {
        let err = EntryName::new("/etc/passwd").unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn test_invalid_segments() {
        assert!(EntryName::new("a//b").is_err());
        assert!(EntryName::new("a/./b").is_err());
        assert!(EntryName::new("a/../b").is_err());
        assert!(EntryName::new("a//").is_err());
        assert!(EntryName::new("/").is_err());
    }

    #[test]
    fn test_length_limit() {
        assert!(EntryName::new(&"a".repeat(MAX_NAME_LENGTH)).is_ok());
        assert!(EntryName::new(&"a".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_try_from() {
        let name: EntryName = "x/y".try_into().unwrap();
        assert_eq!(name.to_string(), "x/y");
        assert!(EntryName::try_from(String::from("..")).is_err());
    }
}
