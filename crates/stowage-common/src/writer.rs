//! Binary writing extensions for streams.
//!
//! The write-side twin of [`ReadExt`](crate::ReadExt): fixed-layout structs go
//! out through zerocopy, scalar fields through `byteorder`'s `WriteBytesExt`.

use std::io::{self, Write};

use zerocopy::{Immutable, IntoBytes};

/// Trait for writing binary data to streams.
///
/// This extends `Write` with a method for writing fixed-size structures.
/// The struct's in-memory layout is the on-disk layout, so records must be
/// `#[repr(C, packed)]`.
pub trait WriteExt: Write {
    /// Write a structure to the stream.
    fn write_struct<T: IntoBytes + Immutable>(&mut self, value: &T) -> io::Result<()> {
        self.write_all(value.as_bytes())
    }
}

impl<W: Write> WriteExt for W {}
