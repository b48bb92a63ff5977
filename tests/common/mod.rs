//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use zipwright::{AddOptions, Archive, BufferSource, OpenMode};

/// Entry contents used by most scenarios.
pub const SAMPLE_ENTRIES: &[(&str, &[u8])] = &[
    ("README", b"Read me first.\n"),
    ("INSTALL", b"Run the installer.\n"),
    ("doc/", b""),
    ("doc/REFMAN", b"Reference manual, chapter one.\n"),
];

/// Builds an in-memory archive image from `(name, data)` pairs.
///
/// Names ending in `/` become directory entries.
pub fn create_archive(entries: &[(&str, &[u8])]) -> zipwright::Result<Vec<u8>> {
    let mut archive = Archive::new_in_memory();
    for (name, data) in entries {
        if name.ends_with('/') {
            archive.add_directory(name)?;
        } else {
            archive.add(name, BufferSource::new(*data), AddOptions::default())?;
        }
    }
    archive.into_bytes()
}

/// Writes an archive built from `entries` to `dir/name` and returns its path.
pub fn write_archive(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    let bytes = create_archive(entries).expect("failed to build archive");
    std::fs::write(&path, bytes).expect("failed to write archive");
    path
}

/// Opens `path` read-write.
pub fn open_rw(path: &Path) -> Archive {
    Archive::open(path, OpenMode::ReadWrite).expect("failed to open archive")
}

/// Reads every file entry as `(name, data)`, in entry order.
pub fn read_contents(archive: &Archive) -> zipwright::Result<Vec<(String, Vec<u8>)>> {
    let mut contents = Vec::new();
    for entry in archive.entries().filter(|e| e.is_file()) {
        let data = archive.open_entry(entry.index, None)?.read_all()?;
        contents.push((entry.name, data));
    }
    Ok(contents)
}

/// Returns the entry names in iteration order.
pub fn names(archive: &Archive) -> Vec<String> {
    archive.entries().map(|e| e.name).collect()
}
