//! Compression codec adapter for ZIP entries.
//!
//! This module puts the per-entry compression methods behind a uniform
//! stream interface ([`Decoder`] / [`Encoder`]) and offers whole-buffer
//! helpers ([`compress`] / [`decompress`]) on top of it.
//!
//! Supported methods:
//!
//! | ID | Method | Implementation |
//! |----|--------|----------------|
//! | 0 | Stored | pass-through |
//! | 8 | Deflate | `flate2` (zlib-rs backend) |
//!
//! Any other method ID is reported as [`Error::UnsupportedMethod`].

mod deflate;
mod stored;

use std::io::{self, Read, Write};

use crate::checksum::{Checksum, Crc32};
use crate::{Error, READ_BUFFER_SIZE, Result};

pub use deflate::{DeflateDecoder, DeflateEncoder, DeflateEncoderOptions};
pub use stored::{StoredDecoder, StoredEncoder};

/// A decoder that reads compressed data and produces uncompressed output.
pub trait Decoder: Read + Send {
    /// Returns the ZIP method ID for this decoder.
    fn method_id(&self) -> u16;
}

/// An encoder that takes uncompressed data and produces compressed output.
pub trait Encoder: Write + Send {
    /// Returns the ZIP method ID for this encoder.
    fn method_id(&self) -> u16;

    /// Finishes encoding and flushes any remaining data.
    fn finish(self: Box<Self>) -> io::Result<()>;
}

/// ZIP compression method IDs.
pub mod method {
    /// No compression.
    pub const STORED: u16 = 0;
    /// Deflate compression.
    pub const DEFLATE: u16 = 8;

    /// Returns a human-readable name for a method ID.
    pub fn name(id: u16) -> &'static str {
        match id {
            STORED => "Stored",
            1 => "Shrink",
            6 => "Implode",
            DEFLATE => "Deflate",
            9 => "Deflate64",
            12 => "BZip2",
            14 => "LZMA",
            93 => "Zstandard",
            95 => "XZ",
            99 => "AES",
            _ => "Unknown",
        }
    }
}

/// Default Deflate compression level.
pub const DEFAULT_LEVEL: u32 = 6;

/// Compression method of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionMethod {
    /// No compression.
    Stored,
    /// Deflate compression.
    #[default]
    Deflate,
    /// A method this crate cannot encode or decode.
    Unknown(u16),
}

impl CompressionMethod {
    /// Converts a header method ID.
    pub fn from_u16(value: u16) -> Self {
        match value {
            method::STORED => Self::Stored,
            method::DEFLATE => Self::Deflate,
            other => Self::Unknown(other),
        }
    }

    /// Returns the header method ID.
    pub fn as_u16(self) -> u16 {
        match self {
            Self::Stored => method::STORED,
            Self::Deflate => method::DEFLATE,
            Self::Unknown(other) => other,
        }
    }

    /// Returns `true` if the method can be encoded and decoded.
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Returns a human-readable name.
    pub fn name(self) -> &'static str {
        method::name(self.as_u16())
    }
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(id) => write!(f, "{} ({})", self.name(), id),
            _ => f.write_str(self.name()),
        }
    }
}

/// Result of [`compress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressed {
    /// The compressed bytes.
    pub data: Vec<u8>,
    /// CRC-32 of the uncompressed bytes.
    pub crc32: u32,
    /// Length of the uncompressed input.
    pub uncompressed_size: u64,
}

/// Builds a decoder over an already bounded compressed stream.
///
/// # Arguments
///
/// * `input` - The compressed bytes of one entry, and nothing after them
/// * `method` - The entry's compression method
/// * `compressed_size` - Length of `input`
///
/// # Errors
///
/// Returns [`Error::UnsupportedMethod`] for unknown methods.
pub fn build_decoder<'a, R: Read + Send + 'a>(
    input: R,
    method: CompressionMethod,
    compressed_size: u64,
) -> Result<Box<dyn Decoder + 'a>> {
    match method {
        CompressionMethod::Stored => Ok(Box::new(StoredDecoder::new(input, compressed_size))),
        CompressionMethod::Deflate => Ok(Box::new(DeflateDecoder::new(input))),
        CompressionMethod::Unknown(method_id) => Err(Error::UnsupportedMethod { method_id }),
    }
}

/// Builds an encoder writing compressed output to `output`.
///
/// `level` only affects Deflate and is clamped to 0-9.
pub fn build_encoder<'a, W: Write + Send + 'a>(
    output: W,
    method: CompressionMethod,
    level: u32,
) -> Result<Box<dyn Encoder + 'a>> {
    match method {
        CompressionMethod::Stored => Ok(Box::new(StoredEncoder::new(output))),
        CompressionMethod::Deflate => Ok(Box::new(DeflateEncoder::new(
            output,
            &DeflateEncoderOptions::with_level(level),
        ))),
        CompressionMethod::Unknown(method_id) => Err(Error::UnsupportedMethod { method_id }),
    }
}

/// Compresses a buffer and computes the CRC-32 of its uncompressed bytes.
///
/// # Example
///
/// ```rust
/// use zipwright::codec::{compress, decompress, CompressionMethod};
///
/// let packed = compress(b"abcabcabcabc", CompressionMethod::Deflate, 6).unwrap();
/// let unpacked = decompress(&packed.data, CompressionMethod::Deflate, 12).unwrap();
/// assert_eq!(unpacked, b"abcabcabcabc");
/// ```
pub fn compress(data: &[u8], method: CompressionMethod, level: u32) -> Result<Compressed> {
    let mut out = Vec::new();
    {
        let mut encoder = build_encoder(&mut out, method, level)?;
        encoder.write_all(data)?;
        encoder.finish()?;
    }
    Ok(Compressed {
        data: out,
        crc32: Crc32::compute(data),
        uncompressed_size: data.len() as u64,
    })
}

/// Decompresses a buffer that must expand to exactly `expected_size` bytes.
///
/// An initial output buffer is reserved up front, bounded by what `data`
/// can expand to; a failed reservation is reported as
/// [`Error::AllocationFailed`].
///
/// # Errors
///
/// Returns [`Error::Codec`] on a corrupt stream or when the output length
/// differs from `expected_size`.
pub fn decompress(data: &[u8], method: CompressionMethod, expected_size: u64) -> Result<Vec<u8>> {
    let mut out = staging_buffer(initial_reservation(expected_size, data.len() as u64))?;
    let decoder = build_decoder(data, method, data.len() as u64)?;
    let method_id = method.as_u16();

    // one extra byte detects streams that expand beyond the recorded size
    let mut bounded = decoder.take(expected_size.saturating_add(1));
    let mut chunk = [0u8; READ_BUFFER_SIZE];
    loop {
        let n = bounded
            .read(&mut chunk)
            .map_err(|e| codec_error(method_id, e))?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&chunk[..n]);
    }

    let actual = out.len() as u64;
    if actual != expected_size {
        return Err(Error::Codec {
            method_id,
            reason: if actual > expected_size {
                format!("stream expands beyond {} bytes", expected_size)
            } else {
                format!("stream ended after {} of {} bytes", actual, expected_size)
            },
        });
    }
    Ok(out)
}

/// Largest expansion a Deflate stream can achieve.
const MAX_EXPANSION: u64 = 1032;

/// Upper bound of an initial output reservation; larger outputs grow on demand.
const INITIAL_RESERVATION_LIMIT: u64 = 1 << 20;

/// Returns how many bytes to reserve before decoding `packed` bytes whose
/// header claims they expand to `claimed` bytes.
///
/// The claim comes from the archive and is not trusted: it is capped by what
/// `packed` bytes can expand to and by a fixed limit.
pub(crate) fn initial_reservation(claimed: u64, packed: u64) -> u64 {
    claimed
        .min(packed.saturating_mul(MAX_EXPANSION))
        .min(INITIAL_RESERVATION_LIMIT)
}

/// Allocates an empty buffer able to hold `size` bytes without growing.
pub(crate) fn staging_buffer(size: u64) -> Result<Vec<u8>> {
    let len = usize::try_from(size).map_err(|_| Error::AllocationFailed { bytes: size })?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed { bytes: size })?;
    Ok(buf)
}

/// Classifies an error raised while decoding.
///
/// Typed errors pass through; malformed-data errors from the codec become
/// [`Error::Codec`]; everything else is I/O.
pub(crate) fn codec_error(method_id: u16, e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput
            if !e.get_ref().is_some_and(|inner| inner.is::<Error>()) =>
        {
            Error::Codec {
                method_id,
                reason: e.to_string(),
            }
        }
        io::ErrorKind::UnexpectedEof => Error::Codec {
            method_id,
            reason: "unexpected end of compressed stream".into(),
        },
        _ => crate::error::map_io_error(e),
    }
}
