//! Error types for the container engine.

use thiserror::Error;

/// Errors that can occur when working with stowage archives.
///
/// Structural problems (bad signatures, multi-volume markers, directory
/// miscounts, unexpected comments, unsupported methods) mean the file does
/// not match the schema this engine writes. `CrcMismatch` means the payload
/// bytes on disk no longer match their recorded checksum. `SizeLimit` guards
/// the 32-bit size fields, which this engine never extends with ZIP64 size
/// overrides. All errors are returned synchronously to the failing call.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] stowage_common::Error),

    /// Invalid ZIP record signature.
    #[error("invalid ZIP signature: expected {expected:#010x}, got {actual:#010x}")]
    InvalidSignature { expected: u32, actual: u32 },

    /// The EOCD record carries an archive comment, which this engine never
    /// writes and does not read.
    #[error("archive comment is not supported ({0} bytes declared)")]
    UnexpectedComment(u16),

    /// Non-zero disk numbers in a trailer record.
    #[error("multi-volume archives are not supported")]
    MultiVolume,

    /// The central directory extends past the trailer that describes it.
    #[error("central directory ends at {dir_end} but the trailer starts at {trailer_offset}")]
    DirOutOfBounds { dir_end: u64, trailer_offset: u64 },

    /// Parsing the central directory consumed a different number of bytes
    /// than the trailer recorded.
    #[error("central directory size mismatch: trailer records {expected} bytes, parsed {actual}")]
    DirSizeMismatch { expected: u64, actual: u64 },

    /// A legacy trailer field holds a ZIP64 sentinel but no ZIP64 record
    /// exists.
    #[error("ZIP64 end of central directory missing despite sentinel values")]
    Zip64Missing,

    /// An entry uses a compression method other than store.
    #[error("unsupported compression method: {0} (only store is supported)")]
    MethodNotStored(u16),

    /// A local header carries sentineled size fields, which this engine
    /// never writes.
    #[error("local header size fields are unresolved ZIP64 sentinels")]
    LocalSizeUnresolved,

    /// An entry size does not fit the 32-bit size fields.
    #[error("entry size {0} exceeds the 32-bit size field")]
    SizeLimit(u64),

    /// Payload checksum mismatch.
    #[error("CRC-32 mismatch: header records {expected:#010x}, payload hashes to {actual:#010x}")]
    CrcMismatch { expected: u32, actual: u32 },

    /// Name absent from the directory.
    #[error("entry not found: {0}")]
    EntryNotFound(String),
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
