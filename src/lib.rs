//! Ustar-rs: read-only access to POSIX ustar archives
//!
//! Given a readable, seekable stream positioned at the start of an archive,
//! this library can:
//! - Validate archive structure (magic, version, header checksum)
//! - Test whether an entry exists and what kind it is
//! - List the immediate children of a directory
//! - Read any window of a file's content without extracting it
//!
//! Symlinks are followed for listing and reading, with a bounded hop count.
//! No index is built: every query is a fresh scan of the stream.
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use ustar_rs::ArchiveReader;
//!
//! let mut reader = ArchiveReader::new(File::open("example.tar")?)?;
//! let headers = reader.validate_archive()?;
//! println!("{} entries", headers);
//!
//! for child in reader.list("dir/")? {
//!     println!("{}", String::from_utf8_lossy(&child));
//! }
//!
//! let mut buf = [0u8; 16];
//! let outcome = reader.read_file("dir/a.txt", 0, &mut buf)?;
//! println!("{:?}", &buf[..outcome.copied]);
//! # Ok::<(), ustar_rs::error::UstarError>(())
//! ```

// Core modules
pub mod archive;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use archive::{
    ArchiveReader, EntryType, Header, ListOutcome, ReadOutcome, BLOCK_SIZE, USTAR_MAGIC,
    USTAR_VERSION,
};
pub use config::ReaderConfig;
pub use error::{Result, UstarError};
