//! In-memory central directory entries.

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use chrono::{DateTime, Datelike, Local, Timelike};
use stowage_common::{BinaryReader, WriteExt};

use crate::zip::central_dir::extra_field;
use crate::zip::{
    CentralDirectoryHeader, LocalFileHeader, CREATOR_VERSION, FLAG_UTF8, METHOD_STORE,
    READER_VERSION,
};
use crate::{Error, Result};

/// One entry of the archive's central directory.
///
/// Entries are created either by [`parse`](DirEntry::parse) when an existing
/// archive is opened, or by [`new_stored`](DirEntry::new_stored) when a blob
/// is appended. They are never mutated afterwards; the engine has no rewrite
/// or removal operation.
///
/// Sizes are kept in 32 bits because the engine rejects larger payloads up
/// front; only the local header offset carries a 64-bit shadow, with the
/// 32-bit field sentineled to 0xFFFFFFFF when the true offset overflows it.
#[derive(Debug, Clone)]
pub struct DirEntry {
    creator_version: u16,
    reader_version: u16,
    flags: u16,
    method: u16,
    modified_time: u16,
    modified_date: u16,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    start_disk_number: u16,
    internal_attrs: u16,
    external_attrs: u32,
    /// 32-bit offset field as stored in the record; 0xFFFFFFFF when
    /// sentineled.
    header_offset: u32,
    /// True offset of the local header, always valid.
    header_offset64: u64,
    /// Unix modification time from the extended timestamp extra field.
    unix_modtime: Option<u32>,
    filename: String,
    extra_local: Vec<u8>,
    extra_central: Vec<u8>,
    comment: Vec<u8>,
}

impl DirEntry {
    /// Build the entry for a stored blob appended at `header_offset64`.
    ///
    /// `size` is both the compressed and uncompressed size; the caller has
    /// already verified it fits 32 bits. When the offset does not fit its
    /// 32-bit field the field is sentineled and the true offset moves into a
    /// ZIP64 extra record on the central header; fields that fit are written
    /// directly and never duplicated into the extra block.
    pub(crate) fn new_stored(
        filename: String,
        size: u32,
        crc32: u32,
        header_offset64: u64,
        now: DateTime<Local>,
    ) -> Self {
        let (modified_date, modified_time) = dos_date_time(&now);
        let unix_modtime = now.timestamp() as u32;

        let header_offset = if header_offset64 < u64::from(u32::MAX) {
            header_offset64 as u32
        } else {
            u32::MAX
        };

        let mut extra_local = Vec::new();
        let mut extra_central = Vec::new();

        if header_offset == u32::MAX {
            push_u16(&mut extra_central, extra_field::ZIP64);
            push_u16(&mut extra_central, 8);
            push_u64(&mut extra_central, header_offset64);
        }

        for extra in [&mut extra_local, &mut extra_central] {
            push_u16(extra, extra_field::EXT_TIMESTAMP);
            push_u16(extra, extra_field::EXT_TIMESTAMP_SIZE);
            extra.push(extra_field::EXT_TIMESTAMP_MODTIME);
            push_u32(extra, unix_modtime);
        }

        Self {
            creator_version: CREATOR_VERSION,
            reader_version: READER_VERSION,
            flags: FLAG_UTF8,
            method: METHOD_STORE,
            modified_time,
            modified_date,
            crc32,
            compressed_size: size,
            uncompressed_size: size,
            start_disk_number: 0,
            internal_attrs: 0,
            external_attrs: 0,
            header_offset,
            header_offset64,
            unix_modtime: Some(unix_modtime),
            filename,
            extra_local,
            extra_central,
            comment: Vec::new(),
        }
    }

    /// Parse one central directory record, signature included.
    pub(crate) fn parse(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let sig = reader.read_u32()?;
        if sig != CentralDirectoryHeader::SIGNATURE {
            return Err(Error::InvalidSignature {
                expected: CentralDirectoryHeader::SIGNATURE,
                actual: sig,
            });
        }

        let header: CentralDirectoryHeader = reader.read_struct()?;
        let filename = reader.read_string(header.file_name_length as usize)?.to_string();
        let extra_central = reader.read_bytes(header.extra_field_length as usize)?.to_vec();
        let comment = reader.read_bytes(header.file_comment_length as usize)?.to_vec();

        let mut entry = Self {
            creator_version: header.version_made_by,
            reader_version: header.version_needed,
            flags: header.flags,
            method: header.compression_method,
            modified_time: header.last_modified as u16,
            modified_date: (header.last_modified >> 16) as u16,
            crc32: header.crc32,
            compressed_size: header.compressed_size,
            uncompressed_size: header.uncompressed_size,
            start_disk_number: header.disk_number_start,
            internal_attrs: header.internal_attrs,
            external_attrs: header.external_attrs,
            header_offset: header.local_header_offset,
            // 32-bit value as default, overridden by a ZIP64 extra record
            header_offset64: u64::from(header.local_header_offset),
            unix_modtime: None,
            filename,
            extra_local: Vec::new(),
            extra_central,
            comment,
        };
        entry.parse_extra()?;
        Ok(entry)
    }

    /// Walk the central extra block, applying the records this engine
    /// recognizes and skipping the rest by their declared size.
    fn parse_extra(&mut self) -> Result<()> {
        let extra = std::mem::take(&mut self.extra_central);
        let mut reader = BinaryReader::new(&extra);

        while !reader.is_empty() {
            let header_id = reader.read_u16()?;
            let data_size = reader.read_u16()?;
            let data = reader.read_bytes(data_size as usize)?;
            let mut data_reader = BinaryReader::new(data);

            match header_id {
                extra_field::ZIP64 => {
                    // 8-byte overrides in fixed order, present only for the
                    // fields whose 32-bit value is sentineled
                    if self.uncompressed_size == u32::MAX {
                        let value = data_reader.read_u64()?;
                        if value > u64::from(u32::MAX) {
                            return Err(Error::SizeLimit(value));
                        }
                        self.uncompressed_size = value as u32;
                    }
                    if self.compressed_size == u32::MAX {
                        let value = data_reader.read_u64()?;
                        if value > u64::from(u32::MAX) {
                            return Err(Error::SizeLimit(value));
                        }
                        self.compressed_size = value as u32;
                    }
                    if self.header_offset == u32::MAX {
                        self.header_offset64 = data_reader.read_u64()?;
                    }
                }
                extra_field::EXT_TIMESTAMP => {
                    let ext_flags = data_reader.read_u8()?;
                    if ext_flags & extra_field::EXT_TIMESTAMP_MODTIME != 0 {
                        self.unix_modtime = Some(data_reader.read_u32()?);
                    }
                }
                _ => {}
            }
        }

        self.extra_central = extra;
        Ok(())
    }

    /// Serialize the central directory record, signature included.
    pub(crate) fn write_central<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_u32::<LittleEndian>(CentralDirectoryHeader::SIGNATURE)?;
        let header = CentralDirectoryHeader {
            version_made_by: self.creator_version,
            version_needed: self.reader_version,
            flags: self.flags,
            compression_method: self.method,
            last_modified: self.last_modified(),
            crc32: self.crc32,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            file_name_length: self.filename.len() as u16,
            extra_field_length: self.extra_central.len() as u16,
            file_comment_length: self.comment.len() as u16,
            disk_number_start: self.start_disk_number,
            internal_attrs: self.internal_attrs,
            external_attrs: self.external_attrs,
            local_header_offset: self.header_offset,
        };
        out.write_struct(&header)?;
        out.write_all(self.filename.as_bytes())?;
        out.write_all(&self.extra_central)?;
        out.write_all(&self.comment)
    }

    /// Serialize the local file header, signature included.
    ///
    /// Local headers always carry true values; the payload follows directly.
    pub(crate) fn write_local<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_u32::<LittleEndian>(LocalFileHeader::SIGNATURE)?;
        let header = LocalFileHeader {
            version_needed: self.reader_version,
            flags: self.flags,
            compression_method: self.method,
            last_modified: self.last_modified(),
            crc32: self.crc32,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            file_name_length: self.filename.len() as u16,
            extra_field_length: self.extra_local.len() as u16,
        };
        out.write_struct(&header)?;
        out.write_all(self.filename.as_bytes())?;
        out.write_all(&self.extra_local)
    }

    /// Get the entry name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.filename
    }

    /// Get the stored (compressed) size in bytes. Always equal to
    /// [`uncompressed_size`](Self::uncompressed_size) for stored entries.
    #[inline]
    pub fn compressed_size(&self) -> u64 {
        u64::from(self.compressed_size)
    }

    /// Get the uncompressed size in bytes.
    #[inline]
    pub fn uncompressed_size(&self) -> u64 {
        u64::from(self.uncompressed_size)
    }

    /// Get the CRC-32 checksum of the payload.
    #[inline]
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Get the Unix modification time, when an extended timestamp was
    /// recorded.
    #[inline]
    pub fn unix_modtime(&self) -> Option<u32> {
        self.unix_modtime
    }

    /// Get the true offset of the entry's local header.
    #[inline]
    pub(crate) fn header_offset64(&self) -> u64 {
        self.header_offset64
    }

    /// DOS time and date packed into the on-disk u32 (time low, date high).
    fn last_modified(&self) -> u32 {
        u32::from(self.modified_time) | (u32::from(self.modified_date) << 16)
    }
}

/// MS-DOS date and time for a local timestamp.
///
/// Date: day | month << 5 | (year - 1980) << 9. Time: second / 2 |
/// minute << 5 | hour << 11.
fn dos_date_time(t: &DateTime<Local>) -> (u16, u16) {
    let date =
        t.day() as u16 | ((t.month() as u16) << 5) | (((t.year() - 1980) as u16) << 9);
    let time = (t.second() as u16) / 2 | ((t.minute() as u16) << 5) | ((t.hour() as u16) << 11);
    (date, time)
}

fn push_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn push_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}
