//! Deferred archive modification.
//!
//! Mutations on an [`Archive`](crate::Archive) are applied to its in-memory
//! directory at once, so queries see them, and recorded in a [`ChangeLog`]
//! that commit consults to decide how each surviving entry is produced:
//!
//! 1. entries with a pending source are encoded from that source
//! 2. entries with a pending recompression are decoded and re-encoded
//! 3. every other entry is copied as raw compressed bytes, with its current
//!    name and comment
//!
//! # Example
//!
//! ```rust
//! use zipwright::{AddOptions, Archive, BufferSource};
//!
//! let mut archive = Archive::new_in_memory();
//! archive.add("a.txt", BufferSource::new("a"), AddOptions::default())?;
//! archive.add("b.txt", BufferSource::new("b"), AddOptions::default())?;
//! let result = archive.commit()?;
//! assert_eq!(result.entries_written, 2);
//! # Ok::<(), zipwright::Error>(())
//! ```

mod change;

pub use change::{Change, ChangeLog};

/// Result of a commit.
#[must_use = "commit result should be checked to verify operation completed as expected"]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitResult {
    /// Entries copied as raw compressed bytes.
    pub entries_copied: usize,
    /// Entries encoded from a pending source.
    pub entries_written: usize,
    /// Existing entries decoded and re-encoded.
    pub entries_recompressed: usize,
    /// Entries removed from the archive.
    pub entries_deleted: usize,
    /// Uncompressed bytes of all entries in the new archive.
    pub total_bytes: u64,
    /// Compressed bytes of all entries in the new archive.
    pub packed_bytes: u64,
}

impl CommitResult {
    /// Returns the number of entries in the resulting archive.
    pub fn total_entries(&self) -> usize {
        self.entries_copied + self.entries_written + self.entries_recompressed
    }

    /// Returns the compression ratio (packed / total).
    pub fn compression_ratio(&self) -> f64 {
        if self.total_bytes == 0 {
            1.0
        } else {
            self.packed_bytes as f64 / self.total_bytes as f64
        }
    }
}
