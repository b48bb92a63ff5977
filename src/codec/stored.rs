//! Stored method (no compression).

use std::io::{self, Read, Write};

use super::{Decoder, Encoder, method};

/// A decoder that passes at most `size` bytes through unchanged.
pub struct StoredDecoder<R> {
    inner: R,
    remaining: u64,
}

impl<R: Read + Send> StoredDecoder<R> {
    /// Creates a new stored decoder.
    ///
    /// # Arguments
    ///
    /// * `inner` - The data source
    /// * `size` - Number of bytes the entry occupies
    pub fn new(inner: R, size: u64) -> Self {
        Self {
            inner,
            remaining: size,
        }
    }
}

impl<R: Read + Send> Read for StoredDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }

        let max_read = self.remaining.min(buf.len() as u64) as usize;
        let n = self.inner.read(&mut buf[..max_read])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}

impl<R: Read + Send> Decoder for StoredDecoder<R> {
    fn method_id(&self) -> u16 {
        method::STORED
    }
}

/// An encoder that writes its input unchanged.
pub struct StoredEncoder<W> {
    inner: W,
}

impl<W: Write + Send> StoredEncoder<W> {
    /// Creates a new stored encoder.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write + Send> Write for StoredEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write + Send> Encoder for StoredEncoder<W> {
    fn method_id(&self) -> u16 {
        method::STORED
    }

    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_decoder_stops_at_size() {
        let mut decoder = StoredDecoder::new(Cursor::new(b"Hello, World!".to_vec()), 5);
        let mut output = Vec::new();
        decoder.read_to_end(&mut output).unwrap();
        assert_eq!(output, b"Hello");
    }

    #[test]
    fn test_decoder_short_input() {
        let mut decoder = StoredDecoder::new(Cursor::new(b"abc".to_vec()), 10);
        let mut output = Vec::new();
        decoder.read_to_end(&mut output).unwrap();
        assert_eq!(output, b"abc");
    }

    #[test]
    fn test_encoder_passthrough() {
        let mut out = Vec::new();
        let mut encoder: Box<dyn Encoder + '_> = Box::new(StoredEncoder::new(&mut out));
        encoder.write_all(b"raw bytes").unwrap();
        assert_eq!(encoder.method_id(), method::STORED);
        encoder.finish().unwrap();
        assert_eq!(out, b"raw bytes");
    }
}
