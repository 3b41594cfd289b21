//! Whole-archive behavior: appends, flushes, reopen cycles, corruption.

use std::fs;
use std::sync::Arc;
use std::thread;

use stowage_zip::{Error, ZipArchive};
use tempfile::TempDir;

fn archive_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("test.zip")
}

#[test]
fn round_trip_various_sizes() {
    let dir = TempDir::new().unwrap();
    let path = archive_path(&dir);

    let blobs: Vec<(String, Vec<u8>)> = [0usize, 1, 4096, 1 << 20]
        .iter()
        .map(|&n| {
            let data: Vec<u8> = (0..n).map(|i| (i * 7 + n) as u8).collect();
            (format!("blob_{}", n), data)
        })
        .collect();

    let archive = ZipArchive::open(&path).unwrap();
    for (name, data) in &blobs {
        archive.add_file(name, data).unwrap();
    }
    archive.flush().unwrap();
    archive.close().unwrap();

    let reopened = ZipArchive::open(&path).unwrap();
    for (name, data) in &blobs {
        assert!(reopened.filenames().contains(name));
        assert_eq!(reopened.get_data(name).unwrap(), *data);
    }
}

#[test]
fn insertion_order_preserved() {
    let dir = TempDir::new().unwrap();
    let path = archive_path(&dir);

    let archive = ZipArchive::open(&path).unwrap();
    for name in ["a", "b", "c"] {
        archive.add_file(name, name.as_bytes()).unwrap();
    }
    archive.close().unwrap();

    let reopened = ZipArchive::open(&path).unwrap();
    assert_eq!(reopened.filenames(), vec!["a", "b", "c"]);
}

#[test]
fn fresh_empty_archive_is_valid() {
    let dir = TempDir::new().unwrap();
    let path = archive_path(&dir);

    let archive = ZipArchive::open(&path).unwrap();
    archive.close().unwrap();

    let reopened = ZipArchive::open(&path).unwrap();
    assert_eq!(reopened.filenames(), Vec::<String>::new());
    assert!(reopened.is_empty());
}

#[test]
fn crc_corruption_detected() {
    let dir = TempDir::new().unwrap();
    let path = archive_path(&dir);

    let payload: &[u8] = b"crc protected payload with a distinctive pattern";

    let archive = ZipArchive::open(&path).unwrap();
    archive.add_file("victim", payload).unwrap();
    archive.close().unwrap();

    // flip one payload byte on disk
    let mut raw = fs::read(&path).unwrap();
    let pos = raw
        .windows(payload.len())
        .position(|w| w == payload)
        .expect("stored payload not found in file");
    raw[pos + 10] ^= 0xFF;
    fs::write(&path, &raw).unwrap();

    let reopened = ZipArchive::open(&path).unwrap();
    assert!(matches!(
        reopened.get_data("victim"),
        Err(Error::CrcMismatch { .. })
    ));
}

#[test]
fn get_data_failure_leaves_archive_usable() {
    let dir = TempDir::new().unwrap();
    let path = archive_path(&dir);

    let archive = ZipArchive::open(&path).unwrap();
    archive.add_file("present", b"data").unwrap();

    assert!(matches!(
        archive.get_data("absent"),
        Err(Error::EntryNotFound(_))
    ));
    // the failed lookup must not have disturbed anything
    assert_eq!(archive.get_data("present").unwrap(), b"data");
}

#[test]
fn duplicate_names_resolve_to_latest() {
    let dir = TempDir::new().unwrap();
    let path = archive_path(&dir);

    let archive = ZipArchive::open(&path).unwrap();
    archive.add_file("dup", b"first").unwrap();
    archive.add_file("dup", b"second").unwrap();
    archive.close().unwrap();

    let reopened = ZipArchive::open(&path).unwrap();
    // both records persist in directory order; lookup favors the latest
    assert_eq!(reopened.filenames(), vec!["dup", "dup"]);
    assert_eq!(reopened.get_data("dup").unwrap(), b"second");
}

#[test]
fn reopen_and_append() {
    let dir = TempDir::new().unwrap();
    let path = archive_path(&dir);

    let archive = ZipArchive::open(&path).unwrap();
    archive.add_file("first", b"one").unwrap();
    archive.close().unwrap();

    let archive = ZipArchive::open(&path).unwrap();
    archive.add_file("second", b"two").unwrap();
    archive.close().unwrap();

    let reopened = ZipArchive::open(&path).unwrap();
    assert_eq!(reopened.filenames(), vec!["first", "second"]);
    assert_eq!(reopened.get_data("first").unwrap(), b"one");
    assert_eq!(reopened.get_data("second").unwrap(), b"two");
}

#[test]
fn unflushed_entries_are_not_durable() {
    let dir = TempDir::new().unwrap();
    let path = archive_path(&dir);

    let archive = ZipArchive::open(&path).unwrap();
    archive.add_file("kept", b"flushed").unwrap();
    archive.flush().unwrap();
    archive.add_file("lost", b"never flushed").unwrap();
    // leak the handle so nothing gets a chance to flush, as in a crash
    std::mem::forget(archive);

    let reopened = ZipArchive::open(&path).unwrap();
    assert_eq!(reopened.filenames(), vec!["kept"]);
    assert_eq!(reopened.get_data("kept").unwrap(), b"flushed");
    assert!(matches!(
        reopened.get_data("lost"),
        Err(Error::EntryNotFound(_))
    ));
}

#[test]
fn drop_flushes_dirty_archive() {
    let dir = TempDir::new().unwrap();
    let path = archive_path(&dir);

    {
        let archive = ZipArchive::open(&path).unwrap();
        archive.add_file("entry", b"data").unwrap();
        // dropped without close or flush
    }

    let reopened = ZipArchive::open(&path).unwrap();
    assert_eq!(reopened.get_data("entry").unwrap(), b"data");
}

#[test]
fn concurrent_readers() {
    let dir = TempDir::new().unwrap();
    let path = archive_path(&dir);

    let names: Vec<String> = (0..8).map(|i| format!("reader_{}", i)).collect();

    let archive = ZipArchive::open(&path).unwrap();
    for (i, name) in names.iter().enumerate() {
        let data: Vec<u8> = (0..2048).map(|b| (b + i) as u8).collect();
        archive.add_file(name, &data).unwrap();
    }
    archive.flush().unwrap();

    let archive = Arc::new(archive);
    let handles: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let archive = Arc::clone(&archive);
            let name = name.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    let data = archive.get_data(&name).unwrap();
                    assert_eq!(data.len(), 2048);
                    assert_eq!(data[0], i as u8);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn legacy_and_zip64_trailers_stay_in_sync() {
    let dir = TempDir::new().unwrap();
    let path = archive_path(&dir);

    const N: u64 = 70_000;

    let archive = ZipArchive::open(&path).unwrap();
    for i in 0..N {
        archive.add_file(&format!("e{:05}", i), b"").unwrap();
    }
    archive.close().unwrap();

    let raw = fs::read(&path).unwrap();

    // the legacy EOCD at end-22 must clamp its 16-bit counts to the sentinel
    let eocd = raw.len() - 22;
    assert_eq!(&raw[eocd..eocd + 4], &[0x50, 0x4b, 0x05, 0x06]);
    let count_disk = u16::from_le_bytes([raw[eocd + 8], raw[eocd + 9]]);
    let count_total = u16::from_le_bytes([raw[eocd + 10], raw[eocd + 11]]);
    assert_eq!(count_disk, 0xFFFF);
    assert_eq!(count_total, 0xFFFF);

    // the ZIP64 EOCD, found through the locator, carries the true count
    let locator = raw.len() - 42;
    assert_eq!(&raw[locator..locator + 4], &[0x50, 0x4b, 0x06, 0x07]);
    let eocd64 = u64::from_le_bytes(raw[locator + 8..locator + 16].try_into().unwrap()) as usize;
    assert_eq!(&raw[eocd64..eocd64 + 4], &[0x50, 0x4b, 0x06, 0x06]);
    let count64 = u64::from_le_bytes(raw[eocd64 + 32..eocd64 + 40].try_into().unwrap());
    assert_eq!(count64, N);

    let reopened = ZipArchive::open(&path).unwrap();
    assert_eq!(reopened.filenames().len() as u64, N);
    assert_eq!(reopened.get_data("e69999").unwrap(), b"");
}
