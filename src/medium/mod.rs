//! Storage Medium Module
//!
//! The byte-addressable region the log lives in.
//!
//! ## Responsibilities
//! - Fixed capacity, known up front
//! - Single-byte reads and writes at absolute offsets
//! - Explicit commit to make pending writes durable
//!
//! Media are opaque byte stores: they know nothing about records,
//! separators or tombstones. The store picks one medium at construction
//! (as a type parameter) and never branches on which one it got.
//!
//! ## Available Media
//! - [`MemoryMedium`] - EEPROM-style array: staged writes, durable on commit
//! - [`FileMedium`] - single file sized to the capacity, durable on write

mod file;
mod memory;

pub use file::FileMedium;
pub use memory::MemoryMedium;

use crate::error::{CellError, Result};

/// A fixed-capacity, byte-addressable storage region.
///
/// # Invariants
///
/// - `capacity` never changes for the lifetime of the medium
/// - `read_byte(i)` returns the last byte written at `i` (committed or not)
/// - after `commit` returns `Ok`, every previous write is durable
pub trait StorageMedium {
    /// Total number of addressable bytes.
    fn capacity(&self) -> usize;

    /// Largest capacity this kind of medium supports.
    fn max_capacity(&self) -> usize {
        usize::MAX
    }

    /// Reads the byte at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::OutOfBounds`] if `offset >= capacity`, or an I/O
    /// error from the underlying device.
    fn read_byte(&self, offset: usize) -> Result<u8>;

    /// Writes one byte at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::OutOfBounds`] if `offset >= capacity`, or an I/O
    /// error from the underlying device.
    fn write_byte(&mut self, offset: usize, byte: u8) -> Result<()>;

    /// Makes all previous writes durable.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::CommitFailed`] (or an I/O error) when the device
    /// refuses the commit. Nothing is retried.
    fn commit(&mut self) -> Result<()>;

    /// Reads `len` bytes starting at `offset`.
    fn read_range(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        check_range(self.capacity(), offset, len)?;
        (offset..offset + len).map(|i| self.read_byte(i)).collect()
    }

    /// Writes `data` starting at `offset`.
    fn write_all_at(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        check_range(self.capacity(), offset, data.len())?;
        for (i, &byte) in data.iter().enumerate() {
            self.write_byte(offset + i, byte)?;
        }
        Ok(())
    }

    /// Overwrites the whole medium with `byte` (not committed).
    fn fill(&mut self, byte: u8) -> Result<()> {
        for i in 0..self.capacity() {
            self.write_byte(i, byte)?;
        }
        Ok(())
    }
}

/// Bounds check shared by the provided range methods and the media.
pub(crate) fn check_range(capacity: usize, offset: usize, len: usize) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(CellError::OutOfBounds {
            offset: offset.saturating_add(len),
            capacity,
        }),
    }
}

impl<M: StorageMedium + ?Sized> StorageMedium for &mut M {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn max_capacity(&self) -> usize {
        (**self).max_capacity()
    }

    fn read_byte(&self, offset: usize) -> Result<u8> {
        (**self).read_byte(offset)
    }

    fn write_byte(&mut self, offset: usize, byte: u8) -> Result<()> {
        (**self).write_byte(offset, byte)
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }

    fn read_range(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        (**self).read_range(offset, len)
    }

    fn write_all_at(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        (**self).write_all_at(offset, data)
    }

    fn fill(&mut self, byte: u8) -> Result<()> {
        (**self).fill(byte)
    }
}
