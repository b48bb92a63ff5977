//! Options for adding and replacing entries.

use crate::codec::{CompressionMethod, DEFAULT_LEVEL};
use crate::crypto::Password;
use crate::timestamp::DosDateTime;

/// Options for a single added or replaced entry.
///
/// # Example
///
/// ```rust
/// use zipwright::{AddOptions, CompressionMethod};
///
/// let options = AddOptions::new()
///     .method(CompressionMethod::Stored)
///     .overwrite(true);
/// assert!(options.overwrite);
///
/// let options = AddOptions::new().level(9)?;
/// assert_eq!(options.level, 9);
/// # Ok::<(), zipwright::Error>(())
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AddOptions {
    /// Adding an existing live name replaces that entry instead of failing.
    pub overwrite: bool,
    /// Compression method for the entry data.
    pub method: CompressionMethod,
    /// Deflate level (0-9).
    pub level: u32,
    /// Modification time; the source's own time or "now" when unset.
    pub modified: Option<DosDateTime>,
    /// Password for this entry only.
    pub password: Option<Password>,
    /// Encrypt with the archive's default password when no own password is set.
    pub encrypt: bool,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            method: CompressionMethod::Deflate,
            level: DEFAULT_LEVEL,
            modified: None,
            password: None,
            encrypt: false,
        }
    }
}

impl std::fmt::Debug for AddOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddOptions")
            .field("overwrite", &self.overwrite)
            .field("method", &self.method)
            .field("level", &self.level)
            .field("modified", &self.modified)
            .field("has_password", &self.password.is_some())
            .field("encrypt", &self.encrypt)
            .finish()
    }
}

impl AddOptions {
    /// Creates options with defaults: Deflate at level 6, no overwrite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the overwrite policy.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets the compression method.
    pub fn method(mut self, method: CompressionMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the compression level (strict validation).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCompressionLevel`](crate::Error::InvalidCompressionLevel)
    /// if level is greater than 9.
    pub fn level(mut self, level: u32) -> crate::Result<Self> {
        if level > 9 {
            return Err(crate::Error::InvalidCompressionLevel { level });
        }
        self.level = level;
        Ok(self)
    }

    /// Sets the compression level, clamping values above 9.
    pub fn level_clamped(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }

    /// Sets the modification time.
    pub fn modified(mut self, modified: impl Into<DosDateTime>) -> Self {
        self.modified = Some(modified.into());
        self
    }

    /// Encrypts the entry with its own password.
    pub fn password(mut self, password: impl Into<Password>) -> Self {
        self.password = Some(password.into());
        self.encrypt = true;
        self
    }

    /// Requests encryption; without an own password the archive default is used.
    pub fn encrypt(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    /// Returns whether the entry is to be encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.encrypt || self.password.is_some()
    }
}
