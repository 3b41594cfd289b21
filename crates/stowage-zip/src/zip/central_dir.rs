//! Central Directory Header structures.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Central Directory File Header (without signature).
///
/// This structure describes a single file entry in the archive's central
/// directory. The 4-byte signature (0x02014b50) is read and written
/// separately. A 32-bit field holding its sentinel value (0xFFFFFFFF) means
/// the true value lives in the ZIP64 extra field of this record.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct CentralDirectoryHeader {
    /// Version made by
    pub version_made_by: u16,
    /// Version needed to extract
    pub version_needed: u16,
    /// General purpose bit flag
    pub flags: u16,
    /// Compression method
    pub compression_method: u16,
    /// File last modification time and date (DOS format)
    pub last_modified: u32,
    /// CRC-32 of uncompressed data
    pub crc32: u32,
    /// Compressed size
    pub compressed_size: u32,
    /// Uncompressed size
    pub uncompressed_size: u32,
    /// File name length
    pub file_name_length: u16,
    /// Extra field length
    pub extra_field_length: u16,
    /// File comment length
    pub file_comment_length: u16,
    /// Disk number where file starts
    pub disk_number_start: u16,
    /// Internal file attributes
    pub internal_attrs: u16,
    /// External file attributes
    pub external_attrs: u32,
    /// Relative offset of local file header
    pub local_header_offset: u32,
}

impl CentralDirectoryHeader {
    /// Central Directory signature as u32.
    pub const SIGNATURE: u32 = 0x02014b50;

    /// Length of the full fixed record including the signature.
    pub const FULL_LENGTH: u64 = 46;

    /// Total variable-length data size following this header.
    pub fn variable_data_size(&self) -> usize {
        self.file_name_length as usize
            + self.extra_field_length as usize
            + self.file_comment_length as usize
    }
}

/// Extra field IDs recognized by this engine.
pub mod extra_field {
    /// ZIP64 extended information extra field.
    ///
    /// Carries 8-byte overrides for sentineled 32-bit fields, in the fixed
    /// order uncompressed size, compressed size, local header offset - only
    /// the values whose 32-bit fields are sentineled are present.
    pub const ZIP64: u16 = 0x0001;

    /// Extended timestamp extra field (Info-ZIP "UT").
    pub const EXT_TIMESTAMP: u16 = 0x5455;

    /// Payload size of the extended timestamp field as written here:
    /// one flag byte plus a 4-byte Unix modification time.
    pub const EXT_TIMESTAMP_SIZE: u16 = 5;

    /// Flag bit indicating a modification time is present. The only bit this
    /// engine honors.
    pub const EXT_TIMESTAMP_MODTIME: u8 = 0x01;
}
