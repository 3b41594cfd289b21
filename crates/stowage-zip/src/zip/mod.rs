//! ZIP format structures.
//!
//! This module contains the low-level structures for the on-disk records of
//! the archive, including the ZIP64 extensions. Each struct maps the fixed
//! part of its record minus the 4-byte signature, which is read and written
//! separately.

pub mod central_dir;
mod eocd;
mod local;

pub use central_dir::CentralDirectoryHeader;
pub use eocd::{Eocd64Locator, Eocd64Record, EocdRecord};
pub use local::LocalFileHeader;

/// Compression method for stored (verbatim, uncompressed) entries.
///
/// This engine reads and writes nothing else.
pub const METHOD_STORE: u16 = 0;

/// General purpose flag bit marking the filename as UTF-8.
pub const FLAG_UTF8: u16 = 0x800;

/// ZIP specification version 4.5 (ZIP64 support).
pub const ZIP_VERSION_45: u16 = 45;

/// ZIP specification version 6.3 (UTF-8 filename support).
pub const ZIP_VERSION_63: u16 = 63;

/// Creator host system: MS-DOS (high byte of the version fields).
pub const CREATOR_DOS: u16 = 0;

/// "Version made by" written on every record this engine produces.
pub const CREATOR_VERSION: u16 = ZIP_VERSION_63 | (CREATOR_DOS << 8);

/// "Version needed to extract" written on every record this engine produces.
pub const READER_VERSION: u16 = ZIP_VERSION_45 | (CREATOR_DOS << 8);
