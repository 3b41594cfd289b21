//! The archive trailer: legacy EOCD, ZIP64 EOCD, and the ZIP64 locator.
//!
//! Three records describe the same facts about the archive. The ZIP64 record
//! is authoritative whenever it exists; the legacy record clamps overflowing
//! values to their sentinels. This engine always writes all three.

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use stowage_common::{ReadExt, WriteExt};

use crate::zip::{Eocd64Locator, Eocd64Record, EocdRecord};
use crate::{Error, Result};

/// The synchronized trailer records of one archive.
#[derive(Debug)]
pub(crate) struct Trailer {
    pub eocd: EocdRecord,
    pub eocd64: Eocd64Record,
    pub locator: Eocd64Locator,
    /// Trailing extra bytes of the ZIP64 EOCD record, preserved verbatim
    /// across rewrites.
    pub eocd64_extra: Vec<u8>,
}

impl Trailer {
    /// Trailer for a fresh, empty archive.
    pub fn new_empty() -> Self {
        let eocd64 = Eocd64Record::empty();
        Self {
            eocd: EocdRecord::clamped_from(&eocd64),
            eocd64,
            locator: Eocd64Locator::single_volume(),
            eocd64_extra: Vec::new(),
        }
    }

    /// Read the trailer from the end of an existing archive.
    ///
    /// The legacy EOCD is expected at exactly `end - 22`: this engine never
    /// writes an archive comment, and a comment would shift the record away
    /// from that fixed offset. No comment-aware backward scan is attempted.
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let eocd_offset = reader.seek(SeekFrom::End(-(EocdRecord::FULL_LENGTH as i64)))?;

        let sig = reader.read_u32::<LittleEndian>()?;
        if sig != EocdRecord::SIGNATURE {
            return Err(Error::InvalidSignature {
                expected: EocdRecord::SIGNATURE,
                actual: sig,
            });
        }
        let eocd: EocdRecord = ReadExt::read_struct(reader)?;

        if eocd.comment_length != 0 {
            return Err(Error::UnexpectedComment(eocd.comment_length));
        }
        if eocd.disk_number != 0 || eocd.central_dir_disk != 0 {
            return Err(Error::MultiVolume);
        }
        if !eocd.is_zip64() {
            let dir_end =
                u64::from(eocd.central_dir_offset) + u64::from(eocd.central_dir_size);
            if dir_end > eocd_offset {
                return Err(Error::DirOutOfBounds {
                    dir_end,
                    trailer_offset: eocd_offset,
                });
            }
        }

        if let Some(trailer) = Self::try_read_zip64(reader, eocd_offset, eocd)? {
            return Ok(trailer);
        }

        // Pre-ZIP64 archive: promote the legacy fields. A sentinel here
        // means the ZIP64 record existed but could not be located.
        if eocd.is_zip64() {
            return Err(Error::Zip64Missing);
        }
        Ok(Self {
            eocd,
            eocd64: Eocd64Record::from_legacy(&eocd),
            locator: Eocd64Locator::single_volume(),
            eocd64_extra: Vec::new(),
        })
    }

    /// Probe for a ZIP64 locator immediately preceding the EOCD and follow
    /// it to the ZIP64 EOCD record.
    ///
    /// Returns `Ok(None)` when either signature does not match, leaving the
    /// caller on the legacy path.
    fn try_read_zip64<R: Read + Seek>(
        reader: &mut R,
        eocd_offset: u64,
        eocd: EocdRecord,
    ) -> Result<Option<Self>> {
        if eocd_offset < Eocd64Locator::FULL_LENGTH {
            return Ok(None);
        }

        reader.seek(SeekFrom::Start(eocd_offset - Eocd64Locator::FULL_LENGTH))?;
        if reader.read_u32::<LittleEndian>()? != Eocd64Locator::SIGNATURE {
            return Ok(None);
        }
        let locator: Eocd64Locator = ReadExt::read_struct(reader)?;

        reader.seek(SeekFrom::Start(locator.zip64_eocd_offset))?;
        if reader.read_u32::<LittleEndian>()? != Eocd64Record::SIGNATURE {
            return Ok(None);
        }
        let eocd64: Eocd64Record = ReadExt::read_struct(reader)?;

        // record_size counts everything after itself; the base record is 44
        // of those bytes, the rest is extra data to carry along
        let extra_len = (eocd64.record_size + 12).saturating_sub(Eocd64Record::FULL_LENGTH);
        let mut eocd64_extra = vec![0u8; extra_len as usize];
        reader.read_exact(&mut eocd64_extra)?;

        if locator.zip64_eocd_disk != 0 || locator.total_disks != 1 {
            return Err(Error::MultiVolume);
        }
        let dir_end = eocd64.central_dir_offset + eocd64.central_dir_size;
        if dir_end > locator.zip64_eocd_offset {
            return Err(Error::DirOutOfBounds {
                dir_end,
                trailer_offset: locator.zip64_eocd_offset,
            });
        }

        Ok(Some(Self {
            eocd,
            eocd64,
            locator,
            eocd64_extra,
        }))
    }

    /// Write the trailer records at the current stream position.
    ///
    /// The caller has already written the central directory bytes; the
    /// stream sits right past them. The order is fixed: ZIP64 EOCD, ZIP64
    /// locator, then the legacy EOCD as the very last bytes of the file - a
    /// reader that catches a partial rewrite must find either the old
    /// trailer or a fully consistent new one.
    pub fn write<W: Write + Seek>(&mut self, writer: &mut W) -> Result<()> {
        self.locator.zip64_eocd_offset = writer.stream_position()?;

        writer.write_u32::<LittleEndian>(Eocd64Record::SIGNATURE)?;
        writer.write_struct(&self.eocd64)?;
        writer.write_all(&self.eocd64_extra)?;

        writer.write_u32::<LittleEndian>(Eocd64Locator::SIGNATURE)?;
        writer.write_struct(&self.locator)?;

        self.eocd = EocdRecord::clamped_from(&self.eocd64);
        writer.write_u32::<LittleEndian>(EocdRecord::SIGNATURE)?;
        writer.write_struct(&self.eocd)?;

        Ok(())
    }

    /// Account for one appended entry: bump the counts, grow the directory
    /// size by the entry's serialized central record, and move the
    /// directory offset past the entry's local header and payload.
    pub fn record_added(&mut self, central_record_len: u64, new_dir_offset: u64) {
        self.eocd64.central_dir_count_disk += 1;
        self.eocd64.central_dir_count_total += 1;
        self.eocd64.central_dir_size += central_record_len;
        self.eocd64.central_dir_offset = new_dir_offset;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// Serialize a legacy-only archive image: `dir_size` filler bytes
    /// followed by a bare EOCD.
    fn legacy_image(eocd: &EocdRecord, padding: usize) -> Vec<u8> {
        let mut buf = vec![0u8; padding];
        buf.write_u32::<LittleEndian>(EocdRecord::SIGNATURE).unwrap();
        buf.write_struct(eocd).unwrap();
        buf
    }

    #[test]
    fn test_empty_trailer_round_trip() {
        let mut image = Cursor::new(Vec::new());
        let mut trailer = Trailer::new_empty();
        trailer.write(&mut image).unwrap();
        assert_eq!(
            image.get_ref().len() as u64,
            Eocd64Record::FULL_LENGTH + Eocd64Locator::FULL_LENGTH + EocdRecord::FULL_LENGTH
        );

        let back = Trailer::read(&mut image).unwrap();
        assert_eq!({ back.eocd64.central_dir_count_total }, 0);
        assert_eq!({ back.eocd64.central_dir_offset }, 0);
        assert_eq!({ back.locator.zip64_eocd_offset }, 0);
    }

    #[test]
    fn test_trailer_round_trip_after_appends() {
        let mut image = Cursor::new(vec![0xAAu8; 300]); // stand-in for headers + directory
        image.seek(SeekFrom::Start(300)).unwrap();

        let mut trailer = Trailer::new_empty();
        trailer.record_added(80, 200);
        trailer.record_added(90, 250);
        trailer.eocd64.central_dir_offset = 130;
        trailer.eocd64.central_dir_size = 170;
        trailer.write(&mut image).unwrap();

        let back = Trailer::read(&mut image).unwrap();
        assert_eq!({ back.eocd64.central_dir_count_total }, 2);
        assert_eq!({ back.eocd64.central_dir_size }, 170);
        assert_eq!({ back.eocd64.central_dir_offset }, 130);
        assert_eq!({ back.locator.zip64_eocd_offset }, 300);
        assert_eq!({ back.eocd.central_dir_count_total }, 2);
    }

    #[test]
    fn test_legacy_archive_promoted() {
        let eocd = EocdRecord {
            disk_number: 0,
            central_dir_disk: 0,
            central_dir_count_disk: 1,
            central_dir_count_total: 1,
            central_dir_size: 50,
            central_dir_offset: 0,
            comment_length: 0,
        };
        let mut image = Cursor::new(legacy_image(&eocd, 50));

        let trailer = Trailer::read(&mut image).unwrap();
        assert_eq!({ trailer.eocd64.central_dir_count_total }, 1);
        assert_eq!({ trailer.eocd64.central_dir_size }, 50);
        assert_eq!({ trailer.locator.total_disks }, 1);
    }

    #[test]
    fn test_sentinel_without_locator_is_fatal() {
        let eocd = EocdRecord {
            disk_number: 0,
            central_dir_disk: 0,
            central_dir_count_disk: 0xFFFF,
            central_dir_count_total: 0xFFFF,
            central_dir_size: 0,
            central_dir_offset: 0,
            comment_length: 0,
        };
        let mut image = Cursor::new(legacy_image(&eocd, 0));

        assert!(matches!(
            Trailer::read(&mut image),
            Err(Error::Zip64Missing)
        ));
    }

    #[test]
    fn test_nonzero_comment_rejected() {
        let eocd = EocdRecord {
            comment_length: 9,
            ..EocdRecord::default()
        };
        let mut image = Cursor::new(legacy_image(&eocd, 0));

        assert!(matches!(
            Trailer::read(&mut image),
            Err(Error::UnexpectedComment(9))
        ));
    }

    #[test]
    fn test_multi_volume_rejected() {
        let eocd = EocdRecord {
            disk_number: 1,
            ..EocdRecord::default()
        };
        let mut image = Cursor::new(legacy_image(&eocd, 0));

        assert!(matches!(Trailer::read(&mut image), Err(Error::MultiVolume)));
    }

    #[test]
    fn test_directory_past_trailer_rejected() {
        let eocd = EocdRecord {
            central_dir_count_disk: 1,
            central_dir_count_total: 1,
            central_dir_size: 100,
            central_dir_offset: 0,
            ..EocdRecord::default()
        };
        // only 10 bytes precede the EOCD, yet it claims a 100-byte directory
        let mut image = Cursor::new(legacy_image(&eocd, 10));

        assert!(matches!(
            Trailer::read(&mut image),
            Err(Error::DirOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_garbage_is_not_an_archive() {
        let mut image = Cursor::new(vec![0x42u8; 64]);
        assert!(matches!(
            Trailer::read(&mut image),
            Err(Error::InvalidSignature { .. })
        ));
    }
}
