//! The archive orchestrator.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use chrono::Local;
use parking_lot::RwLock;
use stowage_common::{crc, ReadExt};

use crate::directory::CentralDirectory;
use crate::entry::DirEntry;
use crate::trailer::Trailer;
use crate::zip::{LocalFileHeader, METHOD_STORE};
use crate::{Error, Result};

/// An append-only ZIP64 container of stored (uncompressed) byte blobs.
///
/// Entries are appended with [`add_file`](Self::add_file) and read back with
/// [`get_data`](Self::get_data); previously written payload bytes are never
/// rewritten. Each append overwrites the trailer region with the new entry
/// and [`flush`](Self::flush) rewrites the central directory and trailer
/// behind it, so the file on disk is a valid archive exactly up to the most
/// recent successful flush.
///
/// A single readers-writer lock governs the whole archive:
/// [`filenames`](Self::filenames) and [`get_data`](Self::get_data) may run
/// concurrently with each other, while [`add_file`](Self::add_file) and
/// [`flush`](Self::flush) exclude everything for their full duration, file
/// I/O included.
///
/// # Example
///
/// ```no_run
/// use stowage_zip::ZipArchive;
///
/// let archive = ZipArchive::open("experiment.zip")?;
/// archive.add_file("plate1/well_a1.tiff", &[0u8; 1024])?;
/// archive.flush()?;
///
/// for name in archive.filenames() {
///     println!("{}", name);
/// }
/// # Ok::<(), stowage_zip::Error>(())
/// ```
pub struct ZipArchive {
    inner: RwLock<Inner>,
}

struct Inner {
    file: File,
    path: PathBuf,
    directory: CentralDirectory,
    trailer: Trailer,
    dirty: bool,
}

impl ZipArchive {
    /// Open an archive, creating a valid empty one if the path does not
    /// exist.
    ///
    /// For an existing file the trailer and the full central directory are
    /// parsed up front; for a fresh file an empty trailer is written
    /// immediately, so the file is a well-formed zero-entry archive even if
    /// nothing is ever added.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if path.exists() {
            let mut file = OpenOptions::new().read(true).write(true).open(&path)?;

            let trailer = Trailer::read(&mut file)?;
            let dir_size = trailer.eocd64.central_dir_size;
            let dir_offset = trailer.eocd64.central_dir_offset;
            let n_records = trailer.eocd64.central_dir_count_total;

            file.seek(SeekFrom::Start(dir_offset))?;
            let mut raw = vec![0u8; dir_size as usize];
            file.read_exact(&mut raw)?;
            let directory = CentralDirectory::parse(raw, n_records)?;

            Ok(Self {
                inner: RwLock::new(Inner {
                    file,
                    path,
                    directory,
                    trailer,
                    dirty: false,
                }),
            })
        } else {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create_new(true)
                .open(&path)?;

            let mut inner = Inner {
                file,
                path,
                directory: CentralDirectory::new(),
                trailer: Trailer::new_empty(),
                dirty: false,
            };
            inner.flush()?;

            Ok(Self {
                inner: RwLock::new(inner),
            })
        }
    }

    /// Entry names in insertion order, duplicates included.
    pub fn filenames(&self) -> Vec<String> {
        self.inner.read().directory.filenames()
    }

    /// Number of directory records.
    pub fn len(&self) -> usize {
        self.inner.read().directory.len()
    }

    /// Check whether the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether a name is present in the directory.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().directory.get(name).is_some()
    }

    /// Entry metadata in insertion order (allocates a snapshot).
    pub fn entries(&self) -> Vec<DirEntry> {
        self.inner.read().directory.iter().cloned().collect()
    }

    /// Read one entry's payload, verifying its CRC-32.
    ///
    /// Runs under the shared lock and may execute concurrently with other
    /// readers; each call reads through its own file handle.
    pub fn get_data(&self, name: &str) -> Result<Vec<u8>> {
        let inner = self.inner.read();
        let entry = inner
            .directory
            .get(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        inner.read_entry(entry)
    }

    /// Append one named blob to the archive.
    ///
    /// The entry's local header and payload are written where the central
    /// directory used to start; the directory and trailer move past them in
    /// memory and reach the disk on the next [`flush`](Self::flush). Data of
    /// 4 GiB or more is rejected: sizes must fit the 32-bit fields, and this
    /// engine does not emit ZIP64 size overrides (only offset overrides).
    ///
    /// Appending a name that already exists adds a second directory record;
    /// both persist in directory order, and lookups resolve to the latest.
    pub fn add_file(&self, name: &str, data: &[u8]) -> Result<()> {
        if data.len() as u64 >= u64::from(u32::MAX) {
            return Err(Error::SizeLimit(data.len() as u64));
        }

        let crc32 = crc::hash_bytes(data);

        let mut inner = self.inner.write();
        let header_offset64 = inner.trailer.eocd64.central_dir_offset;
        let entry = DirEntry::new_stored(
            name.to_string(),
            data.len() as u32,
            crc32,
            header_offset64,
            Local::now(),
        );

        // the new entry and the directory share the same append point
        inner.file.seek(SeekFrom::Start(header_offset64))?;
        inner.dirty = true;

        let mut writer = BufWriter::new(&mut inner.file);
        entry.write_local(&mut writer)?;
        writer.write_all(data)?;
        writer.flush()?;
        drop(writer);

        let new_dir_offset = inner.file.stream_position()?;
        let central_record_len = inner.directory.add(entry)?;
        inner.trailer.record_added(central_record_len, new_dir_offset);

        Ok(())
    }

    /// Write the central directory and trailer to disk and sync the file.
    ///
    /// No-op when nothing was added since the last flush. Durability is
    /// guaranteed only up to the most recent successful flush; entries added
    /// after it exist solely in memory and in orphaned bytes past the last
    /// valid trailer.
    pub fn flush(&self) -> Result<()> {
        let mut inner = self.inner.write();
        if !inner.dirty {
            return Ok(());
        }
        inner.flush()
    }

    /// Flush if needed, then release the file handle and all in-memory
    /// state.
    pub fn close(self) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.dirty {
            inner.flush()?;
        }
        Ok(())
    }
}

impl Inner {
    /// The full trailer rewrite: directory mirror at the directory offset,
    /// ZIP64 EOCD, ZIP64 locator, legacy EOCD, then a durable sync. The
    /// legacy record must be the last bytes written.
    fn flush(&mut self) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(self.trailer.eocd64.central_dir_offset))?;

        let mut writer = BufWriter::new(&mut self.file);
        writer.write_all(self.directory.mirror())?;
        self.trailer.write(&mut writer)?;
        writer.flush()?;
        drop(writer);

        self.file.sync_all()?;
        self.dirty = false;
        Ok(())
    }

    /// Read and verify one entry through a private read-only handle, so
    /// concurrent readers never contend for a shared cursor.
    fn read_entry(&self, entry: &DirEntry) -> Result<Vec<u8>> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(entry.header_offset64()))?;

        let sig = reader.read_u32::<LittleEndian>()?;
        if sig != LocalFileHeader::SIGNATURE {
            return Err(Error::InvalidSignature {
                expected: LocalFileHeader::SIGNATURE,
                actual: sig,
            });
        }
        let header: LocalFileHeader = ReadExt::read_struct(&mut reader)?;

        // the local header has its own name and extra fields; skip them
        let mut variable = vec![0u8; header.variable_data_size()];
        reader.read_exact(&mut variable)?;

        if header.compression_method != METHOD_STORE {
            return Err(Error::MethodNotStored(header.compression_method));
        }
        // local headers are written with true values right before their
        // payload; a sentinel here is not this engine's output
        if header.compressed_size == u32::MAX || header.uncompressed_size == u32::MAX {
            return Err(Error::LocalSizeUnresolved);
        }

        let mut data = vec![0u8; entry.compressed_size() as usize];
        reader.read_exact(&mut data)?;

        let actual = crc::hash_bytes(&data);
        if actual != header.crc32 {
            return Err(Error::CrcMismatch {
                expected: header.crc32,
                actual,
            });
        }

        Ok(data)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // best-effort: an abandoned handle still lands its trailer
        if self.dirty {
            let _ = self.flush();
        }
    }
}

impl std::fmt::Debug for ZipArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("ZipArchive")
            .field("path", &inner.path)
            .field("entries", &inner.directory.len())
            .field("dirty", &inner.dirty)
            .finish()
    }
}
