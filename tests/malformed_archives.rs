//! Tests for malformed, truncated and corrupted archives.
//!
//! Every failure must surface as an error of the right kind; none may
//! panic or return wrong data silently.

mod common;

use zipwright::{AddOptions, Archive, BufferSource, CompressionMethod, Error, ErrorKind, OpenMode};

const PAYLOAD: &[u8] = b"payload bytes that are stored verbatim";

/// Builds an archive with one stored entry so its data can be located.
fn stored_archive() -> Vec<u8> {
    let mut archive = Archive::new_in_memory();
    archive
        .add(
            "entry",
            BufferSource::new(PAYLOAD),
            AddOptions::new().method(CompressionMethod::Stored),
        )
        .unwrap();
    archive.into_bytes().unwrap()
}

fn find(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
        .expect("needle not found")
}

#[test]
fn test_not_a_zip() {
    for input in [&b""[..], b"PK", b"hello world, this is plain text"] {
        let err = Archive::from_bytes(input.to_vec(), OpenMode::ReadOnly).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format, "input {:?}", input);
    }
}

#[test]
fn test_non_zip_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.zip");
    std::fs::write(&path, "these are notes, not an archive").unwrap();
    let err = Archive::open(&path, OpenMode::ReadWrite).unwrap_err();
    assert!(matches!(err, Error::InvalidFormat(_)));
}

#[test]
fn test_truncated_archive() {
    let bytes = stored_archive();
    let truncated = bytes[..bytes.len() - 10].to_vec();
    let err = Archive::from_bytes(truncated, OpenMode::ReadOnly).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_corrupted_data_fails_crc() {
    let mut bytes = stored_archive();
    let at = find(&bytes, PAYLOAD);
    bytes[at + 3] ^= 0xFF;

    let archive = Archive::from_bytes(bytes, OpenMode::ReadOnly).unwrap();
    let err = archive.open_entry(0, None).unwrap().read_all().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Integrity);
    assert!(matches!(err, Error::CrcMismatch { .. }));
    assert!(err.is_corruption());
}

#[test]
fn test_corrupted_data_fails_recompress_commit() {
    let mut bytes = stored_archive();
    let at = find(&bytes, PAYLOAD);
    bytes[at] ^= 0x01;

    let mut archive = Archive::from_bytes(bytes.clone(), OpenMode::ReadWrite).unwrap();
    archive.set_compression(0, CompressionMethod::Deflate, 6).unwrap();
    let err = archive.commit().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Integrity);
    archive.discard();
}

#[test]
fn test_unsupported_method() {
    let mut bytes = stored_archive();
    // Method field of the central directory header.
    let at = find(&bytes, b"PK\x01\x02") + 10;
    bytes[at] = 12;

    let archive = Archive::from_bytes(bytes, OpenMode::ReadOnly).unwrap();
    assert_eq!(archive.stat(0).unwrap().method, CompressionMethod::Unknown(12));
    let err = archive.open_entry(0, None).unwrap_err();
    assert!(matches!(err, Error::UnsupportedMethod { method_id: 12 }));
    assert_eq!(err.kind(), ErrorKind::Codec);
}

#[test]
fn test_directory_offset_out_of_bounds() {
    let mut bytes = stored_archive();
    let eocd = bytes.len() - 22;
    // Central directory offset field of the trailing record.
    bytes[eocd + 16..eocd + 20].copy_from_slice(&0x00FF_FFFFu32.to_le_bytes());
    let err = Archive::from_bytes(bytes, OpenMode::ReadOnly).unwrap_err();
    assert!(matches!(err, Error::CorruptHeader { .. }));
}

#[test]
fn test_zip64_marker_rejected() {
    let mut bytes = stored_archive();
    let eocd = bytes.len() - 22;
    bytes[eocd + 8..eocd + 10].copy_from_slice(&0xFFFFu16.to_le_bytes());
    bytes[eocd + 10..eocd + 12].copy_from_slice(&0xFFFFu16.to_le_bytes());
    let err = Archive::from_bytes(bytes, OpenMode::ReadOnly).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFeature { .. }));
}

#[test]
fn test_bad_local_header_signature() {
    let mut bytes = stored_archive();
    bytes[0] = b'X';
    let archive = Archive::from_bytes(bytes, OpenMode::ReadOnly).unwrap();
    let err = archive.open_entry(0, None).unwrap_err();
    assert!(matches!(err, Error::CorruptHeader { offset: 0, .. }));
}

#[test]
fn test_comment_containing_trailer_signature() {
    let mut archive = Archive::new_in_memory();
    archive
        .add("a", BufferSource::new("a"), AddOptions::default())
        .unwrap();
    // A comment that itself contains an end-of-directory signature.
    archive.set_comment("PK\u{5}\u{6} is not a real trailing record here").unwrap();
    let bytes = archive.into_bytes().unwrap();

    let archive = Archive::from_bytes(bytes, OpenMode::ReadOnly).unwrap();
    assert_eq!(archive.comment(), "PK\u{5}\u{6} is not a real trailing record here");
    assert_eq!(archive.len(), 1);
}
