//! Password handling and traditional PKWARE encryption.
//!
//! ZIP's original "ZipCrypto" stream cipher is the only encryption scheme
//! this crate reads and writes. It is weak by modern standards and should be
//! treated as obfuscation, not confidentiality.
//!
//! An encrypted entry's data starts with a 12-byte encryption header. After
//! decryption its last byte must equal a check byte derived from the entry:
//! the high byte of the CRC-32, or the high byte of the DOS time word when
//! the entry uses a data descriptor (general purpose bit 3). A mismatch
//! means the password is wrong.

mod password;
mod zipcrypto;

pub use password::Password;
pub use zipcrypto::{ENCRYPTION_HEADER_LEN, ZipCryptoReader, ZipCryptoWriter};

pub(crate) use zipcrypto::check_byte;
