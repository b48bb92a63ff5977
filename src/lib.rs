//! # zipwright
//!
//! A pure-Rust library for reading and editing ZIP archives.
//!
//! An archive is opened (or created), its directory is queried and edited
//! in memory, and nothing reaches the archive file until the changes are
//! committed. A commit writes a complete new archive next to the target and
//! swaps it in, so a failed commit never damages the original.
//!
//! ## Quick Start
//!
//! ### Reading an Archive
//!
//! ```rust,no_run
//! use zipwright::{Archive, OpenMode, Result};
//!
//! fn main() -> Result<()> {
//!     let archive = Archive::open("archive.zip", OpenMode::ReadOnly)?;
//!
//!     // List entries
//!     for entry in archive.entries() {
//!         println!("{}: {} bytes", entry.name, entry.size);
//!     }
//!
//!     // Read one entry, verifying its CRC-32
//!     let data = archive.open_entry_by_name("README", None)?.read_all()?;
//!     println!("{}", String::from_utf8_lossy(&data));
//!     Ok(())
//! }
//! ```
//!
//! ### Editing an Archive
//!
//! ```rust,no_run
//! use zipwright::{AddOptions, Archive, BufferSource, FileSource, OpenMode, Result};
//!
//! fn main() -> Result<()> {
//!     let mut archive = Archive::open("docs.zip", OpenMode::CreateIfMissing)?;
//!
//!     archive.add("hello.txt", BufferSource::new("Hello, World!"), AddOptions::default())?;
//!     archive.add("notes.txt", FileSource::new("notes.txt"), AddOptions::default())?;
//!     archive.add_directory("doc")?;
//!
//!     if let Ok(index) = archive.find("obsolete.txt") {
//!         archive.remove(index)?;
//!     }
//!     archive.set_comment("built by zipwright")?;
//!
//!     let result = archive.close()?;
//!     println!(
//!         "{} entries, {} written, {} copied",
//!         result.total_entries(),
//!         result.entries_written,
//!         result.entries_copied
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ### Encrypted Entries
//!
//! Traditional PKWARE encryption is supported for reading and writing:
//!
//! ```rust
//! use zipwright::{AddOptions, Archive, BufferSource, Password};
//!
//! let mut archive = Archive::new_in_memory();
//! archive.add("secret.txt", BufferSource::new("Secret data"), AddOptions::new().password("pw"))?;
//! archive.commit()?;
//!
//! let data = archive.open_entry(0, Some(&Password::new("pw")))?.read_all()?;
//! assert_eq!(data, b"Secret data");
//! # Ok::<(), zipwright::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`]. [`Error::kind`] sorts every error
//! into a coarse [`ErrorKind`] for callers that only need the category:
//!
//! ```rust,no_run
//! use zipwright::{Archive, ErrorKind, OpenMode};
//!
//! match Archive::open("maybe.zip", OpenMode::ReadOnly) {
//!     Ok(archive) => println!("{} entries", archive.len()),
//!     Err(e) if e.kind() == ErrorKind::Format => eprintln!("not a ZIP archive: {}", e),
//!     Err(e) => eprintln!("cannot open: {}", e),
//! }
//! ```
//!
//! ## Format Support
//!
//! | Feature | Status |
//! |---------|--------|
//! | Stored, Deflate | Read and write |
//! | Traditional PKWARE encryption | Read and write |
//! | Entry and archive comments | Read and write |
//! | UTF-8 names (general purpose bit 11) | Read and write |
//! | ZIP64, multi-disk, strong encryption | Rejected as unsupported |
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

/// Default buffer size for read operations (8 KiB).
pub(crate) const READ_BUFFER_SIZE: usize = 8192;

mod archive;
pub mod checksum;
pub mod codec;
pub mod crypto;
pub(crate) mod directory;
pub mod edit;
pub mod entry_name;
pub mod error;
pub mod format;
pub mod read;
pub mod source;
pub(crate) mod store;
pub mod timestamp;
pub mod write;

pub use archive::{Archive, ArchiveFlag, OpenMode};
pub use codec::CompressionMethod;
pub use crypto::Password;
pub use edit::CommitResult;
pub use entry_name::EntryName;
pub use error::{Error, ErrorKind, Result};
pub use read::{Entries, EntryMetadata, EntryReader};
pub use source::{BufferSource, EntrySource, FileSource};
pub use timestamp::DosDateTime;
pub use write::AddOptions;
