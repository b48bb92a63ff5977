//! Tests against archives written by other tools.
//!
//! The fixtures are small enough to embed. Each was produced once with the
//! tool named in its doc comment; `hello.txt` holds [`HELLO`] and was last
//! modified at 2024-03-15 12:34:56.

mod common;

use zipwright::{
    AddOptions, Archive, BufferSource, CompressionMethod, DosDateTime, Error, ErrorKind, OpenMode,
    Password,
};

const HELLO: &[u8] = b"Hello from Info-ZIP.\nHello from Info-ZIP.\nHello from Info-ZIP.\n";

/// 2024-03-15 12:34:56 UTC.
const HELLO_MODIFIED: i64 = 1_710_506_096;

/// `zip hello.txt` (Info-ZIP 3.0). The local header carries the `UT` extra field
/// with both mtime and atime, so it is four bytes longer than the central one.
const INFO_ZIP_DEFLATED: &[u8] = &[
    0x50, 0x4b, 0x03, 0x04, 0x14, 0x00, 0x00, 0x00, 0x08, 0x00, 0x5c, 0x64, 0x6f, 0x58, 0x7b, 0x1b,
    0x34, 0x58, 0x1a, 0x00, 0x00, 0x00, 0x3f, 0x00, 0x00, 0x00, 0x09, 0x00, 0x1c, 0x00, 0x68, 0x65,
    0x6c, 0x6c, 0x6f, 0x2e, 0x74, 0x78, 0x74, 0x55, 0x54, 0x09, 0x00, 0x03, 0x70, 0x40, 0xf4, 0x65,
    0x70, 0x40, 0xf4, 0x65, 0x75, 0x78, 0x0b, 0x00, 0x01, 0x04, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00,
    0x00, 0x00, 0x00, 0xf3, 0x48, 0xcd, 0xc9, 0xc9, 0x57, 0x48, 0x2b, 0xca, 0xcf, 0x55, 0xf0, 0xcc,
    0x4b, 0xcb, 0xd7, 0x8d, 0xf2, 0x0c, 0xd0, 0xe3, 0xf2, 0x20, 0x5a, 0x10, 0x00, 0x50, 0x4b, 0x01,
    0x02, 0x1e, 0x03, 0x14, 0x00, 0x00, 0x00, 0x08, 0x00, 0x5c, 0x64, 0x6f, 0x58, 0x7b, 0x1b, 0x34,
    0x58, 0x1a, 0x00, 0x00, 0x00, 0x3f, 0x00, 0x00, 0x00, 0x09, 0x00, 0x18, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x01, 0x00, 0x00, 0x00, 0xa4, 0x81, 0x00, 0x00, 0x00, 0x00, 0x68, 0x65, 0x6c, 0x6c, 0x6f,
    0x2e, 0x74, 0x78, 0x74, 0x55, 0x54, 0x05, 0x00, 0x03, 0x70, 0x40, 0xf4, 0x65, 0x75, 0x78, 0x0b,
    0x00, 0x01, 0x04, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x50, 0x4b, 0x05, 0x06,
    0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x4f, 0x00, 0x00, 0x00, 0x5d, 0x00, 0x00, 0x00,
    0x00, 0x00,
];

/// `zip - hello.txt` (Info-ZIP 3.0) writing to a pipe: general purpose bit 3 is
/// set, the local header has zero CRC and sizes, and a signed data descriptor
/// follows the Deflate data.
const INFO_ZIP_STREAMED: &[u8] = &[
    0x50, 0x4b, 0x03, 0x04, 0x14, 0x00, 0x08, 0x00, 0x08, 0x00, 0x5c, 0x64, 0x6f, 0x58, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x3f, 0x00, 0x00, 0x00, 0x09, 0x00, 0x1c, 0x00, 0x68, 0x65,
    0x6c, 0x6c, 0x6f, 0x2e, 0x74, 0x78, 0x74, 0x55, 0x54, 0x09, 0x00, 0x03, 0x70, 0x40, 0xf4, 0x65,
    0xeb, 0x41, 0xd5, 0x6a, 0x75, 0x78, 0x0b, 0x00, 0x01, 0x04, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00,
    0x00, 0x00, 0x00, 0xf3, 0x48, 0xcd, 0xc9, 0xc9, 0x57, 0x48, 0x2b, 0xca, 0xcf, 0x55, 0xf0, 0xcc,
    0x4b, 0xcb, 0xd7, 0x8d, 0xf2, 0x0c, 0xd0, 0xe3, 0xf2, 0x20, 0x5a, 0x10, 0x00, 0x50, 0x4b, 0x07,
    0x08, 0x7b, 0x1b, 0x34, 0x58, 0x1a, 0x00, 0x00, 0x00, 0x3f, 0x00, 0x00, 0x00, 0x50, 0x4b, 0x01,
    0x02, 0x1e, 0x03, 0x14, 0x00, 0x08, 0x00, 0x08, 0x00, 0x5c, 0x64, 0x6f, 0x58, 0x7b, 0x1b, 0x34,
    0x58, 0x1a, 0x00, 0x00, 0x00, 0x3f, 0x00, 0x00, 0x00, 0x09, 0x00, 0x18, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x01, 0x00, 0x00, 0x00, 0xa4, 0x81, 0x00, 0x00, 0x00, 0x00, 0x68, 0x65, 0x6c, 0x6c, 0x6f,
    0x2e, 0x74, 0x78, 0x74, 0x55, 0x54, 0x05, 0x00, 0x03, 0x70, 0x40, 0xf4, 0x65, 0x75, 0x78, 0x0b,
    0x00, 0x01, 0x04, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x50, 0x4b, 0x05, 0x06,
    0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x4f, 0x00, 0x00, 0x00, 0x6d, 0x00, 0x00, 0x00,
    0x00, 0x00,
];

/// `zip` of a file whose name is the raw bytes `caf\x82.txt`: no UTF-8 flag, so
/// the name is CP437 and reads as "café.txt".
const INFO_ZIP_CP437_NAME: &[u8] = &[
    0x50, 0x4b, 0x03, 0x04, 0x0a, 0x00, 0x00, 0x00, 0x00, 0x00, 0x5c, 0x64, 0x6f, 0x58, 0x22, 0xe8,
    0xc7, 0x5b, 0x0b, 0x00, 0x00, 0x00, 0x0b, 0x00, 0x00, 0x00, 0x08, 0x00, 0x1c, 0x00, 0x63, 0x61,
    0x66, 0x82, 0x2e, 0x74, 0x78, 0x74, 0x55, 0x54, 0x09, 0x00, 0x03, 0x70, 0x40, 0xf4, 0x65, 0x70,
    0x40, 0xf4, 0x65, 0x75, 0x78, 0x0b, 0x00, 0x01, 0x04, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00,
    0x00, 0x00, 0x63, 0x70, 0x34, 0x33, 0x37, 0x20, 0x6e, 0x61, 0x6d, 0x65, 0x0a, 0x50, 0x4b, 0x01,
    0x02, 0x1e, 0x03, 0x0a, 0x00, 0x00, 0x00, 0x00, 0x00, 0x5c, 0x64, 0x6f, 0x58, 0x22, 0xe8, 0xc7,
    0x5b, 0x0b, 0x00, 0x00, 0x00, 0x0b, 0x00, 0x00, 0x00, 0x08, 0x00, 0x18, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x01, 0x00, 0x00, 0x00, 0xa4, 0x81, 0x00, 0x00, 0x00, 0x00, 0x63, 0x61, 0x66, 0x82, 0x2e,
    0x74, 0x78, 0x74, 0x55, 0x54, 0x05, 0x00, 0x03, 0x70, 0x40, 0xf4, 0x65, 0x75, 0x78, 0x0b, 0x00,
    0x01, 0x04, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x50, 0x4b, 0x05, 0x06, 0x00,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x4e, 0x00, 0x00, 0x00, 0x4d, 0x00, 0x00, 0x00, 0x00,
    0x00,
];

/// `zip -P secret hello.txt` (Info-ZIP 3.0): ZipCrypto with bit 3 set, so the
/// check byte comes from the DOS time.
const INFO_ZIP_ENCRYPTED: &[u8] = &[
    0x50, 0x4b, 0x03, 0x04, 0x14, 0x00, 0x09, 0x00, 0x08, 0x00, 0x5c, 0x64, 0x6f, 0x58, 0x7b, 0x1b,
    0x34, 0x58, 0x26, 0x00, 0x00, 0x00, 0x3f, 0x00, 0x00, 0x00, 0x09, 0x00, 0x1c, 0x00, 0x68, 0x65,
    0x6c, 0x6c, 0x6f, 0x2e, 0x74, 0x78, 0x74, 0x55, 0x54, 0x09, 0x00, 0x03, 0x70, 0x40, 0xf4, 0x65,
    0xeb, 0x41, 0xd5, 0x6a, 0x75, 0x78, 0x0b, 0x00, 0x01, 0x04, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00,
    0x00, 0x00, 0x00, 0x4d, 0xa0, 0xa0, 0x2d, 0x83, 0x9f, 0xde, 0xb5, 0x45, 0xfd, 0x29, 0xbc, 0x8d,
    0x2d, 0xdb, 0xa8, 0xda, 0x22, 0xe2, 0x00, 0xb9, 0x0f, 0x3d, 0x66, 0xa2, 0x19, 0xd5, 0x0b, 0xd8,
    0xc4, 0x98, 0x06, 0xf7, 0x9d, 0x47, 0x21, 0xda, 0xfe, 0x50, 0x4b, 0x07, 0x08, 0x7b, 0x1b, 0x34,
    0x58, 0x26, 0x00, 0x00, 0x00, 0x3f, 0x00, 0x00, 0x00, 0x50, 0x4b, 0x01, 0x02, 0x1e, 0x03, 0x14,
    0x00, 0x09, 0x00, 0x08, 0x00, 0x5c, 0x64, 0x6f, 0x58, 0x7b, 0x1b, 0x34, 0x58, 0x26, 0x00, 0x00,
    0x00, 0x3f, 0x00, 0x00, 0x00, 0x09, 0x00, 0x18, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00,
    0x00, 0xa4, 0x81, 0x00, 0x00, 0x00, 0x00, 0x68, 0x65, 0x6c, 0x6c, 0x6f, 0x2e, 0x74, 0x78, 0x74,
    0x55, 0x54, 0x05, 0x00, 0x03, 0x70, 0x40, 0xf4, 0x65, 0x75, 0x78, 0x0b, 0x00, 0x01, 0x04, 0x00,
    0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x50, 0x4b, 0x05, 0x06, 0x00, 0x00, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x4f, 0x00, 0x00, 0x00, 0x79, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// The deflated `hello.txt` encrypted with "secret" the way 7-Zip and WinZip
/// write ZipCrypto: no data descriptor, check byte from the CRC-32.
const CRC_KEYED_ENCRYPTED: &[u8] = &[
    0x50, 0x4b, 0x03, 0x04, 0x14, 0x00, 0x01, 0x00, 0x08, 0x00, 0x5c, 0x64, 0x6f, 0x58, 0x7b, 0x1b,
    0x34, 0x58, 0x26, 0x00, 0x00, 0x00, 0x3f, 0x00, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x68, 0x65,
    0x6c, 0x6c, 0x6f, 0x2e, 0x74, 0x78, 0x74, 0xd9, 0x57, 0x34, 0x1e, 0x5a, 0xf5, 0x7c, 0xff, 0xee,
    0xcf, 0x6d, 0x9d, 0x65, 0x57, 0xf9, 0x96, 0x65, 0x1a, 0x24, 0x19, 0x32, 0x28, 0x88, 0x6a, 0x73,
    0x09, 0xfd, 0xa5, 0xe3, 0xc8, 0x3b, 0x2f, 0x99, 0x65, 0x66, 0x17, 0x06, 0xcc, 0x50, 0x4b, 0x01,
    0x02, 0x14, 0x03, 0x14, 0x00, 0x01, 0x00, 0x08, 0x00, 0x5c, 0x64, 0x6f, 0x58, 0x7b, 0x1b, 0x34,
    0x58, 0x26, 0x00, 0x00, 0x00, 0x3f, 0x00, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0xa4, 0x81, 0x00, 0x00, 0x00, 0x00, 0x68, 0x65, 0x6c, 0x6c, 0x6f,
    0x2e, 0x74, 0x78, 0x74, 0x50, 0x4b, 0x05, 0x06, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00,
    0x37, 0x00, 0x00, 0x00, 0x4d, 0x00, 0x00, 0x00, 0x00, 0x00,
];

fn open(bytes: &[u8]) -> Archive {
    Archive::from_bytes(bytes.to_vec(), OpenMode::ReadWrite).unwrap()
}

fn read(archive: &Archive, name: &str, password: Option<&Password>) -> zipwright::Result<Vec<u8>> {
    archive.open_entry_by_name(name, password)?.read_all()
}

/// Adds an entry, commits, and reopens the result, so every foreign entry
/// goes through the raw-copy path.
fn edit_and_reopen(mut archive: Archive) -> Archive {
    archive
        .add("added.txt", BufferSource::new("added"), AddOptions::default())
        .unwrap();
    let bytes = archive.into_bytes().unwrap();
    Archive::from_bytes(bytes, OpenMode::ReadOnly).unwrap()
}

// ============================================================================
// Headers
// ============================================================================

#[test]
fn test_local_extra_longer_than_central() {
    let archive = open(INFO_ZIP_DEFLATED);
    assert_eq!(common::names(&archive), ["hello.txt"]);

    let meta = archive.stat(0).unwrap();
    assert_eq!(meta.method, CompressionMethod::Deflate);
    assert_eq!(meta.size, HELLO.len() as u64);
    assert_eq!(meta.compressed_size, 26);
    assert_eq!(meta.crc32, 0x5834_1b7b);
    assert_eq!(meta.modified, DosDateTime::from_unix_secs(HELLO_MODIFIED));
    assert!(!meta.is_encrypted);

    assert_eq!(read(&archive, "hello.txt", None).unwrap(), HELLO);
}

#[test]
fn test_local_extra_survives_raw_copy() {
    let mut archive = open(INFO_ZIP_DEFLATED);
    archive.rename(0, "greeting.txt").unwrap();
    let archive = edit_and_reopen(archive);

    assert_eq!(common::names(&archive), ["greeting.txt", "added.txt"]);
    assert_eq!(read(&archive, "greeting.txt", None).unwrap(), HELLO);
    assert_eq!(read(&archive, "added.txt", None).unwrap(), b"added");
}

#[test]
fn test_streamed_entry_with_data_descriptor() {
    let archive = open(INFO_ZIP_STREAMED);
    let meta = archive.stat_name("hello.txt").unwrap();
    assert_eq!(meta.size, HELLO.len() as u64);
    assert_eq!(meta.crc32, 0x5834_1b7b);
    assert_eq!(read(&archive, "hello.txt", None).unwrap(), HELLO);

    let archive = edit_and_reopen(archive);
    assert_eq!(archive.len(), 2);
    assert_eq!(read(&archive, "hello.txt", None).unwrap(), HELLO);
}

#[test]
fn test_cp437_name() {
    let archive = open(INFO_ZIP_CP437_NAME);
    assert_eq!(common::names(&archive), ["caf\u{e9}.txt"]);
    assert_eq!(archive.find("café.txt").unwrap(), 0);
    assert_eq!(read(&archive, "café.txt", None).unwrap(), b"cp437 name\n");

    let archive = edit_and_reopen(archive);
    assert_eq!(archive.find("café.txt").unwrap(), 0);
    assert_eq!(read(&archive, "café.txt", None).unwrap(), b"cp437 name\n");
}

// ============================================================================
// Encryption
// ============================================================================

#[test]
fn test_time_keyed_encrypted_entry() {
    let archive = open(INFO_ZIP_ENCRYPTED);
    assert!(archive.stat(0).unwrap().is_encrypted);

    let data = read(&archive, "hello.txt", Some(&Password::new("secret"))).unwrap();
    assert_eq!(data, HELLO);

    let err = read(&archive, "hello.txt", None).unwrap_err();
    assert!(matches!(err, Error::PasswordRequired { .. }));
    let err = read(&archive, "hello.txt", Some(&Password::new("wrong"))).unwrap_err();
    assert!(matches!(err, Error::WrongPassword { .. }));
}

#[test]
fn test_crc_keyed_encrypted_entry() {
    let archive = open(CRC_KEYED_ENCRYPTED);
    let meta = archive.stat(0).unwrap();
    assert!(meta.is_encrypted);
    assert_eq!(meta.compressed_size, 26 + 12);

    let data = read(&archive, "hello.txt", Some(&Password::new("secret"))).unwrap();
    assert_eq!(data, HELLO);

    let err = read(&archive, "hello.txt", Some(&Password::new("wrong"))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(err.entry_name(), Some("hello.txt"));
}

#[test]
fn test_encrypted_entries_copied_without_password() {
    for fixture in [INFO_ZIP_ENCRYPTED, CRC_KEYED_ENCRYPTED] {
        let archive = edit_and_reopen(open(fixture));
        assert!(archive.stat_name("hello.txt").unwrap().is_encrypted);
        let data = read(&archive, "hello.txt", Some(&Password::new("secret"))).unwrap();
        assert_eq!(data, HELLO);
    }
}
