//! CRC-32 as ZIP uses it.
//!
//! Every entry records the CRC-32 (IEEE polynomial) of its uncompressed
//! bytes three times over: in the local header, in the central directory and,
//! for streamed entries, in the data descriptor. Reading recomputes it to
//! detect corruption; writing computes it while the source streams into the
//! encoder, since the header is patched or followed by a descriptor only once
//! the data is through.
//!
//! The traditional PKWARE cipher reuses the same polynomial for its key
//! schedule, on the raw register rather than the finished value; see
//! `crc32_raw_update`.
//!
//! # Example
//!
//! ```rust
//! use zipwright::checksum::{Checksum, Crc32};
//!
//! let mut crc = Crc32::new();
//! crc.update(b"Read me ");
//! crc.update(b"first.\n");
//! assert_eq!(crc.finalize(), Crc32::compute(b"Read me first.\n"));
//! ```

use std::io::{self, Read};

/// An incremental checksum.
pub trait Checksum: Default + Clone {
    /// The checksum value.
    type Output: Copy + Eq + std::fmt::Debug;

    /// Starts an empty checksum.
    fn new() -> Self;

    /// Feeds more bytes.
    fn update(&mut self, data: &[u8]);

    /// Returns the checksum of everything fed so far.
    fn finalize(&self) -> Self::Output;

    /// Checksums one slice.
    fn compute(data: &[u8]) -> Self::Output {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

/// The CRC-32 stored in ZIP headers, backed by `crc32fast`.
///
/// ```rust
/// use zipwright::checksum::{Checksum, Crc32};
///
/// assert_eq!(Crc32::compute(b"123456789"), 0xCBF4_3926);
/// ```
#[derive(Clone, Default)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Crc32({:#010x})", self.finalize())
    }
}

impl Checksum for Crc32 {
    type Output = u32;

    fn new() -> Self {
        Self::default()
    }

    fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn finalize(&self) -> u32 {
        self.hasher.clone().finalize()
    }
}

/// Advances a raw (non-inverted) CRC-32 register by one byte.
pub(crate) fn crc32_raw_update(register: u32, byte: u8) -> u32 {
    let mut hasher = crc32fast::Hasher::new_with_initial(!register);
    hasher.update(&[byte]);
    !hasher.finalize()
}

/// Wraps an entry source and records the CRC-32 and size its header needs.
///
/// ```rust
/// use std::io::Read;
/// use zipwright::checksum::{Checksum, Crc32, EntryDigestReader};
///
/// let mut reader = EntryDigestReader::new(&b"Run the installer.\n"[..]);
/// std::io::copy(&mut reader, &mut std::io::sink())?;
/// assert_eq!(reader.size(), 19);
/// assert_eq!(reader.crc(), Crc32::compute(b"Run the installer.\n"));
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct EntryDigestReader<R> {
    inner: R,
    crc: Crc32,
    size: u64,
}

impl<R> EntryDigestReader<R> {
    /// Starts digesting `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            crc: Crc32::new(),
            size: 0,
        }
    }

    /// CRC-32 of the bytes read so far.
    pub fn crc(&self) -> u32 {
        self.crc.finalize()
    }

    /// Number of bytes read so far.
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl<R: Read> Read for EntryDigestReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.crc.update(&buf[..n]);
        self.size += n as u64;
        Ok(n)
    }
}
