//! CRC-32 checksum utilities.
//!
//! This is the ISO-HDLC polynomial used by the ZIP format, as computed by
//! `crc32fast`. Note that this is not CRC-32C (Castagnoli); the two are not
//! interchangeable.

/// Compute the CRC-32 checksum of a byte slice.
///
/// Uses hardware acceleration when available.
#[inline]
pub fn hash_bytes(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Re-export of the streaming hasher for incremental checksums.
pub use crc32fast::Hasher;
