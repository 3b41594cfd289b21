//! End of Central Directory (EOCD) structures.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::{CREATOR_VERSION, READER_VERSION};

/// End of Central Directory Record (without signature).
///
/// This is the legacy ZIP EOCD record found at the very end of the archive.
/// The 4-byte signature (0x06054b50) is read and written separately. For
/// ZIP64 archives, fields contain 0xFFFF or 0xFFFFFFFF to indicate that the
/// actual values are in the ZIP64 EOCD record.
#[derive(Debug, Default, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct EocdRecord {
    /// Number of this disk
    pub disk_number: u16,
    /// Disk where central directory starts
    pub central_dir_disk: u16,
    /// Number of central directory records on this disk
    pub central_dir_count_disk: u16,
    /// Total number of central directory records
    pub central_dir_count_total: u16,
    /// Size of central directory (bytes)
    pub central_dir_size: u32,
    /// Offset of start of central directory
    pub central_dir_offset: u32,
    /// Comment length
    pub comment_length: u16,
}

impl EocdRecord {
    /// EOCD signature as u32.
    pub const SIGNATURE: u32 = 0x06054b50;

    /// Length of the full fixed record including the signature.
    pub const FULL_LENGTH: u64 = 22;

    /// Check if any field carries a ZIP64 sentinel value.
    ///
    /// When true the legacy record is not authoritative and a ZIP64 EOCD
    /// record must exist.
    pub fn is_zip64(&self) -> bool {
        self.central_dir_count_total == 0xFFFF
            || self.central_dir_offset == 0xFFFFFFFF
            || self.central_dir_size == 0xFFFFFFFF
    }

    /// Build the legacy record from the authoritative ZIP64 view, clamping
    /// every overflowing value to its sentinel.
    pub fn clamped_from(eocd64: &Eocd64Record) -> Self {
        Self {
            disk_number: 0,
            central_dir_disk: 0,
            central_dir_count_disk: clamp_u16(eocd64.central_dir_count_disk),
            central_dir_count_total: clamp_u16(eocd64.central_dir_count_total),
            central_dir_size: clamp_u32(eocd64.central_dir_size),
            central_dir_offset: clamp_u32(eocd64.central_dir_offset),
            comment_length: 0,
        }
    }
}

fn clamp_u16(value: u64) -> u16 {
    if value < 0xFFFF {
        value as u16
    } else {
        0xFFFF
    }
}

fn clamp_u32(value: u64) -> u32 {
    if value < 0xFFFFFFFF {
        value as u32
    } else {
        0xFFFFFFFF
    }
}

/// ZIP64 End of Central Directory Locator (without signature).
///
/// Sits immediately before the legacy EOCD and points to the ZIP64 EOCD
/// record. The 4-byte signature (0x07064b50) is read and written separately.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Eocd64Locator {
    /// Disk number containing ZIP64 EOCD
    pub zip64_eocd_disk: u32,
    /// Offset of ZIP64 EOCD record
    pub zip64_eocd_offset: u64,
    /// Total number of disks
    pub total_disks: u32,
}

impl Eocd64Locator {
    /// ZIP64 EOCD Locator signature as u32.
    pub const SIGNATURE: u32 = 0x07064b50;

    /// Length of the full fixed record including the signature.
    pub const FULL_LENGTH: u64 = 20;

    /// Locator for a single-volume archive. The target offset is filled in
    /// when the trailer is written.
    pub fn single_volume() -> Self {
        Self {
            zip64_eocd_disk: 0,
            zip64_eocd_offset: 0,
            total_disks: 1,
        }
    }
}

/// ZIP64 End of Central Directory Record (without signature).
///
/// The authoritative description of the archive whenever present. The 4-byte
/// signature (0x06064b50) is read and written separately.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Eocd64Record {
    /// Size of this record, not counting the signature and this field
    pub record_size: u64,
    /// Version made by
    pub version_made_by: u16,
    /// Version needed to extract
    pub version_needed: u16,
    /// This disk number
    pub disk_number: u32,
    /// Disk where central directory starts
    pub central_dir_disk: u32,
    /// Number of central directory records on this disk
    pub central_dir_count_disk: u64,
    /// Total number of central directory records
    pub central_dir_count_total: u64,
    /// Size of central directory (bytes)
    pub central_dir_size: u64,
    /// Offset of start of central directory
    pub central_dir_offset: u64,
}

impl Eocd64Record {
    /// ZIP64 EOCD signature as u32.
    pub const SIGNATURE: u32 = 0x06064b50;

    /// Length of the full fixed record including the signature.
    pub const FULL_LENGTH: u64 = 56;

    /// `record_size` value for a record with no trailing extra bytes:
    /// the fixed length minus the 12 bytes of signature and size field.
    pub const BASE_RECORD_SIZE: u64 = Self::FULL_LENGTH - 12;

    /// A fresh record for an empty single-volume archive.
    pub fn empty() -> Self {
        Self {
            record_size: Self::BASE_RECORD_SIZE,
            version_made_by: CREATOR_VERSION,
            version_needed: READER_VERSION,
            disk_number: 0,
            central_dir_disk: 0,
            central_dir_count_disk: 0,
            central_dir_count_total: 0,
            central_dir_size: 0,
            central_dir_offset: 0,
        }
    }

    /// Promote a pre-ZIP64 legacy record to the 64-bit view.
    ///
    /// Only valid when none of the legacy fields hold a sentinel; callers
    /// must check [`EocdRecord::is_zip64`] first.
    pub fn from_legacy(eocd: &EocdRecord) -> Self {
        Self {
            record_size: Self::BASE_RECORD_SIZE,
            version_made_by: CREATOR_VERSION,
            version_needed: READER_VERSION,
            disk_number: u32::from(eocd.disk_number),
            central_dir_disk: u32::from(eocd.central_dir_disk),
            central_dir_count_disk: u64::from(eocd.central_dir_count_disk),
            central_dir_count_total: u64::from(eocd.central_dir_count_total),
            central_dir_size: u64::from(eocd.central_dir_size),
            central_dir_offset: u64::from(eocd.central_dir_offset),
        }
    }
}
