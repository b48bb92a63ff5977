//! Traditional PKWARE stream cipher.

use std::io::{self, Read, Write};

use zeroize::Zeroize;

use super::Password;
use crate::checksum::crc32_raw_update;

/// Length of the encryption header that precedes encrypted entry data.
pub const ENCRYPTION_HEADER_LEN: u64 = 12;

/// The three-word cipher state.
struct Keys {
    k0: u32,
    k1: u32,
    k2: u32,
}

impl Keys {
    fn new(password: &Password) -> Self {
        let mut keys = Self {
            k0: 0x1234_5678,
            k1: 0x2345_6789,
            k2: 0x3456_7890,
        };
        for &b in password.as_bytes() {
            keys.update(b);
        }
        keys
    }

    fn update(&mut self, plain: u8) {
        self.k0 = crc32_raw_update(self.k0, plain);
        self.k1 = self
            .k1
            .wrapping_add(self.k0 & 0xFF)
            .wrapping_mul(134_775_813)
            .wrapping_add(1);
        self.k2 = crc32_raw_update(self.k2, (self.k1 >> 24) as u8);
    }

    fn stream_byte(&self) -> u8 {
        let t = (self.k2 as u16) | 2;
        (t.wrapping_mul(t ^ 1) >> 8) as u8
    }

    fn decrypt(&mut self, cipher: u8) -> u8 {
        let plain = cipher ^ self.stream_byte();
        self.update(plain);
        plain
    }

    fn encrypt(&mut self, plain: u8) -> u8 {
        let cipher = plain ^ self.stream_byte();
        self.update(plain);
        cipher
    }
}

impl Drop for Keys {
    fn drop(&mut self) {
        self.k0.zeroize();
        self.k1.zeroize();
        self.k2.zeroize();
    }
}

/// Returns the byte the decrypted header must end with.
///
/// Entries written with a data descriptor do not know their CRC when the
/// header is produced, so they are checked against the DOS time instead.
pub(crate) fn check_byte(crc32: u32, dos_time: u16, uses_data_descriptor: bool) -> u8 {
    if uses_data_descriptor {
        (dos_time >> 8) as u8
    } else {
        (crc32 >> 24) as u8
    }
}

/// A reader that decrypts an encrypted entry stream.
///
/// Construction consumes and validates the 12-byte header.
pub struct ZipCryptoReader<R> {
    inner: R,
    keys: Keys,
}

impl<R: Read> ZipCryptoReader<R> {
    /// Reads the encryption header and checks it against `expected_check`.
    ///
    /// Returns `Ok(None)` when the password does not match.
    pub fn new(mut inner: R, password: &Password, expected_check: u8) -> io::Result<Option<Self>> {
        let mut keys = Keys::new(password);
        let mut header = [0u8; ENCRYPTION_HEADER_LEN as usize];
        inner.read_exact(&mut header)?;
        for b in header.iter_mut() {
            *b = keys.decrypt(*b);
        }
        if header[11] != expected_check {
            return Ok(None);
        }
        Ok(Some(Self { inner, keys }))
    }
}

impl<R: Read> Read for ZipCryptoReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        for b in &mut buf[..n] {
            *b = self.keys.decrypt(*b);
        }
        Ok(n)
    }
}

/// A writer that encrypts everything written through it.
///
/// Construction writes the 12-byte header.
pub struct ZipCryptoWriter<W> {
    inner: W,
    keys: Keys,
    buffer: Vec<u8>,
}

impl<W: Write> ZipCryptoWriter<W> {
    /// Writes a fresh encryption header ending in `check` and returns the writer.
    pub fn new(mut inner: W, password: &Password, check: u8) -> io::Result<Self> {
        let mut keys = Keys::new(password);
        let mut header = [0u8; ENCRYPTION_HEADER_LEN as usize];
        getrandom::getrandom(&mut header[..11]).map_err(io::Error::from)?;
        header[11] = check;
        for b in header.iter_mut() {
            *b = keys.encrypt(*b);
        }
        inner.write_all(&header)?;
        Ok(Self {
            inner,
            keys,
            buffer: Vec::new(),
        })
    }

    /// Returns the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ZipCryptoWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.clear();
        self.buffer
            .extend(buf.iter().map(|&b| self.keys.encrypt(b)));
        self.inner.write_all(&self.buffer)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
