//! Append-only ZIP64 container engine.
//!
//! Stowage keeps a growing collection of named, uncompressed byte blobs
//! inside a single on-disk ZIP archive. Existing entries are read in place
//! and new ones appended without rewriting previously written payload bytes:
//! each append lands where the central directory used to start, and the
//! directory plus its trailer records are rewritten behind it on flush.
//!
//! The format is plain ZIP with the ZIP64 extensions, so archives stay
//! readable by standard tools past the 4 GiB and 65 535-entry limits of the
//! legacy records. Only the store method is supported - payloads go in
//! verbatim, guarded by CRC-32.
//!
//! # Example
//!
//! ```no_run
//! use stowage_zip::ZipArchive;
//!
//! let archive = ZipArchive::open("experiment.zip")?;
//! archive.add_file("plate1/well_a1.tiff", b"...image bytes...")?;
//! archive.flush()?;
//!
//! let data = archive.get_data("plate1/well_a1.tiff")?;
//! assert_eq!(&data[..], b"...image bytes...");
//! # Ok::<(), stowage_zip::Error>(())
//! ```

mod archive;
mod directory;
mod entry;
mod error;
mod trailer;
pub mod zip;

pub use archive::ZipArchive;
pub use entry::DirEntry;
pub use error::{Error, Result};
