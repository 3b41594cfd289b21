//! The in-memory central directory and its serialized byte mirror.

use std::collections::HashMap;

use stowage_common::BinaryReader;

use crate::entry::DirEntry;
use crate::zip::CentralDirectoryHeader;
use crate::{Error, Result};

/// Ordered central directory plus a name-keyed index.
///
/// Entries are owned by the ordered list alone; the index maps names to
/// positions in it. Alongside the entries lives the `mirror`: the serialized
/// bytes of every record in directory order. The mirror only ever grows by
/// the bytes of newly appended records - existing records are never
/// re-encoded - and is written to disk as a single block on flush.
///
/// Duplicate names are kept: appending an existing name adds a second record
/// in directory order, and the index points at the latest one.
#[derive(Debug, Default)]
pub(crate) struct CentralDirectory {
    entries: Vec<DirEntry>,
    index: HashMap<String, usize>,
    mirror: Vec<u8>,
}

impl CentralDirectory {
    /// An empty directory for a fresh archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a directory from its raw bytes as read from disk.
    ///
    /// `raw` must be exactly the `dir_size` bytes the trailer records, and
    /// must decode to exactly `n_records` entries; anything else is
    /// directory corruption or a miscount. The buffer itself becomes the
    /// byte mirror.
    pub fn parse(raw: Vec<u8>, n_records: u64) -> Result<Self> {
        // a record is at least its 46 fixed bytes; cap the preallocation by
        // what the buffer could possibly hold
        let capacity =
            n_records.min(raw.len() as u64 / CentralDirectoryHeader::FULL_LENGTH) as usize;
        let mut entries = Vec::with_capacity(capacity);
        let mut index = HashMap::with_capacity(capacity);

        let mut reader = BinaryReader::new(&raw);
        for _ in 0..n_records {
            let entry = DirEntry::parse(&mut reader)?;
            index.insert(entry.name().to_string(), entries.len());
            entries.push(entry);
        }

        if reader.position() != raw.len() {
            return Err(Error::DirSizeMismatch {
                expected: raw.len() as u64,
                actual: reader.position() as u64,
            });
        }

        Ok(Self {
            entries,
            index,
            mirror: raw,
        })
    }

    /// Append an entry, serializing its central record onto the mirror.
    ///
    /// Returns the number of bytes the mirror grew by.
    pub fn add(&mut self, entry: DirEntry) -> Result<u64> {
        let before = self.mirror.len();
        entry.write_central(&mut self.mirror)?;
        self.index.insert(entry.name().to_string(), self.entries.len());
        self.entries.push(entry);
        Ok((self.mirror.len() - before) as u64)
    }

    /// Look up an entry by name. For duplicate names this is the latest one.
    pub fn get(&self, name: &str) -> Option<&DirEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Entry names in insertion order.
    pub fn filenames(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name().to_string()).collect()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries.iter()
    }

    /// Number of directory records, duplicates included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The serialized directory bytes.
    pub fn mirror(&self) -> &[u8] {
        &self.mirror
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};

    use super::*;

    fn entry(name: &str, offset: u64) -> DirEntry {
        let now = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 6).unwrap();
        DirEntry::new_stored(name.to_string(), 4, 0x1234, offset, now)
    }

    #[test]
    fn test_mirror_grows_by_serialized_record() {
        let mut dir = CentralDirectory::new();
        let added = dir.add(entry("one", 0)).unwrap();
        assert_eq!(added, dir.mirror().len() as u64);

        let mut expected = Vec::new();
        dir.iter().next().unwrap().write_central(&mut expected).unwrap();
        assert_eq!(dir.mirror(), &expected[..]);
    }

    #[test]
    fn test_parse_round_trip() {
        let mut dir = CentralDirectory::new();
        dir.add(entry("a", 0)).unwrap();
        dir.add(entry("b", 100)).unwrap();

        let reparsed = CentralDirectory::parse(dir.mirror().to_vec(), 2).unwrap();
        assert_eq!(reparsed.filenames(), vec!["a", "b"]);
        assert_eq!(reparsed.mirror(), dir.mirror());
    }

    #[test]
    fn test_size_mismatch_is_fatal() {
        let mut dir = CentralDirectory::new();
        dir.add(entry("a", 0)).unwrap();

        let mut raw = dir.mirror().to_vec();
        raw.push(0); // one stray byte past the declared record

        assert!(matches!(
            CentralDirectory::parse(raw, 1),
            Err(Error::DirSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_short_directory_is_fatal() {
        let mut dir = CentralDirectory::new();
        dir.add(entry("a", 0)).unwrap();

        // claim two records where only one is present
        assert!(CentralDirectory::parse(dir.mirror().to_vec(), 2).is_err());
    }

    #[test]
    fn test_duplicate_names_keep_both_records() {
        let mut dir = CentralDirectory::new();
        dir.add(entry("same", 0)).unwrap();
        dir.add(entry("same", 512)).unwrap();

        assert_eq!(dir.len(), 2);
        assert_eq!(dir.filenames(), vec!["same", "same"]);
        // lookup favors the latest record
        assert_eq!(dir.get("same").unwrap().header_offset64(), 512);
    }
}
