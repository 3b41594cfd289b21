//! Common utilities for Stowage.
//!
//! This crate provides the foundational types shared by the Stowage crates:
//!
//! - [`BinaryReader`] - Zero-copy binary reading from byte slices
//! - [`ReadExt`] / [`WriteExt`] - Stream extensions for fixed-layout structs
//! - [`crc`] - CRC-32 checksum utilities (the ZIP polynomial)

mod error;
mod reader;
mod writer;

pub mod crc;

pub use error::{Error, Result};
pub use reader::{BinaryReader, ReadExt};
pub use writer::WriteExt;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
