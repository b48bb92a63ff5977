//! Deflate method, backed by `flate2`.
//!
//! ZIP stores raw Deflate streams (RFC 1951) with no zlib or gzip framing.

use std::io::{self, BufReader, Read, Write};

use flate2::Compression;
use flate2::bufread::DeflateDecoder as FlateDecoder;
use flate2::write::DeflateEncoder as FlateEncoder;

use super::{DEFAULT_LEVEL, Decoder, Encoder, method};

/// Deflate decoder.
pub struct DeflateDecoder<R> {
    inner: FlateDecoder<BufReader<R>>,
}

impl<R> std::fmt::Debug for DeflateDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeflateDecoder").finish_non_exhaustive()
    }
}

impl<R: Read + Send> DeflateDecoder<R> {
    /// Creates a new Deflate decoder over a raw Deflate stream.
    pub fn new(input: R) -> Self {
        Self {
            inner: FlateDecoder::new(BufReader::new(input)),
        }
    }
}

impl<R: Read + Send> Read for DeflateDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read + Send> Decoder for DeflateDecoder<R> {
    fn method_id(&self) -> u16 {
        method::DEFLATE
    }
}

/// Deflate encoder options.
#[derive(Debug, Clone)]
pub struct DeflateEncoderOptions {
    /// Compression level (0-9, default 6).
    pub level: u32,
}

impl Default for DeflateEncoderOptions {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
        }
    }
}

impl DeflateEncoderOptions {
    /// Creates options with the given compression level, clamped to 9.
    pub fn with_level(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }
}

/// Deflate encoder.
pub struct DeflateEncoder<W: Write> {
    inner: FlateEncoder<W>,
}

impl<W: Write> std::fmt::Debug for DeflateEncoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeflateEncoder").finish_non_exhaustive()
    }
}

impl<W: Write + Send> DeflateEncoder<W> {
    /// Creates a new Deflate encoder.
    pub fn new(output: W, options: &DeflateEncoderOptions) -> Self {
        Self {
            inner: FlateEncoder::new(output, Compression::new(options.level)),
        }
    }

    /// Finishes encoding and returns the output sink.
    pub fn try_finish(self) -> io::Result<W> {
        self.inner.finish()
    }
}

impl<W: Write + Send> Write for DeflateEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write + Send> Encoder for DeflateEncoder<W> {
    fn method_id(&self) -> u16 {
        method::DEFLATE
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        let mut sink = self.inner.finish()?;
        sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn deflate(data: &[u8], level: u32) -> Vec<u8> {
        let mut encoder =
            DeflateEncoder::new(Vec::new(), &DeflateEncoderOptions::with_level(level));
        encoder.write_all(data).unwrap();
        encoder.try_finish().unwrap()
    }

    #[test]
    fn test_round_trip_across_levels() {
        let data = b"Hello, World! This is a test of Deflate compression. ".repeat(20);
        for level in [0, 1, 6, 9] {
            let packed = deflate(&data, level);
            let mut decoder = DeflateDecoder::new(Cursor::new(packed));
            let mut out = Vec::new();
            decoder.read_to_end(&mut out).unwrap();
            assert_eq!(out, data, "level {}", level);
        }
    }

    #[test]
    fn test_options_clamp() {
        assert_eq!(DeflateEncoderOptions::default().level, 6);
        assert_eq!(DeflateEncoderOptions::with_level(100).level, 9);
    }

    #[test]
    fn test_decoder_stops_at_end_of_stream() {
        let mut packed = deflate(b"payload", 6);
        packed.extend_from_slice(b"trailing garbage");
        let mut decoder = DeflateDecoder::new(Cursor::new(packed));
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"payload");
        assert_eq!(decoder.method_id(), method::DEFLATE);
    }
}
