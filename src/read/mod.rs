//! Entry reading API.
//!
//! # Example
//!
//! ```rust
//! use zipwright::{AddOptions, Archive, BufferSource};
//!
//! let mut archive = Archive::new_in_memory();
//! archive.add("README", BufferSource::new("read me"), AddOptions::default())?;
//! archive.add("INSTALL", BufferSource::new("install"), AddOptions::default())?;
//! archive.commit()?;
//!
//! // List entries
//! for entry in archive.entries() {
//!     println!("{}: {} bytes", entry.name, entry.size);
//! }
//!
//! // Read one
//! let data = archive.open_entry_by_name("README", None)?.read_all()?;
//! assert_eq!(data, b"read me");
//! # Ok::<(), zipwright::Error>(())
//! ```

mod entry;
mod reader;

pub use entry::EntryMetadata;
pub use reader::EntryReader;

use crate::Archive;

/// Iterator over the live entries of an archive, in slot order.
///
/// Created by [`Archive::entries`]. Double-ended and exact-size, so it can be
/// reversed and indexed with [`Iterator::nth`].
#[derive(Debug)]
pub struct Entries<'a> {
    archive: &'a Archive,
    indices: std::vec::IntoIter<usize>,
}

impl<'a> Entries<'a> {
    pub(crate) fn new(archive: &'a Archive, indices: Vec<usize>) -> Self {
        Self {
            archive,
            indices: indices.into_iter(),
        }
    }
}

impl Iterator for Entries<'_> {
    type Item = EntryMetadata;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.indices.next()?;
        self.archive.metadata_at(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        let index = self.indices.nth(n)?;
        self.archive.metadata_at(index)
    }
}

impl DoubleEndedIterator for Entries<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let index = self.indices.next_back()?;
        self.archive.metadata_at(index)
    }
}

impl ExactSizeIterator for Entries<'_> {}

impl std::iter::FusedIterator for Entries<'_> {}
