//! In-memory EEPROM-style medium.

use crate::error::{CellError, Result};

use super::{check_range, StorageMedium};

/// Erased-cell value of a fresh EEPROM/flash array.
const ERASED: u8 = 0xFF;

/// A fixed-size byte array with explicit commit.
///
/// Writes land in a staging image; `commit` copies the staging image into
/// the committed image, which is what survives a power cycle
/// ([`MemoryMedium::power_cycle`]). This mirrors the emulated EEPROM on
/// microcontrollers, where `write` touches a RAM shadow and `commit` burns
/// it to flash.
///
/// A fresh medium reads as erased cells (`0xFF`) and has no log end
/// marker; the store must be formatted before use.
///
/// # Example
///
/// ```rust
/// use cellkv::medium::{MemoryMedium, StorageMedium};
///
/// let mut medium = MemoryMedium::new(64);
/// medium.write_byte(0, b'a').unwrap();
/// assert_eq!(medium.committed()[0], 0xFF);
/// medium.commit().unwrap();
/// assert_eq!(medium.committed()[0], b'a');
/// ```
#[derive(Debug, Clone)]
pub struct MemoryMedium {
    staged: Vec<u8>,
    committed: Vec<u8>,
    /// Number of upcoming commits that will be refused
    failing_commits: usize,
    commit_count: u64,
}

impl MemoryMedium {
    /// Largest array the EEPROM emulation supports (in bytes)
    pub const MAX_CAPACITY: usize = 4096;

    /// Creates an erased medium of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self::with_data(vec![ERASED; capacity])
    }

    /// Creates a medium whose staged and committed images are `data`.
    ///
    /// Useful for testing recovery scenarios.
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            committed: data.clone(),
            staged: data,
            failing_commits: 0,
            commit_count: 0,
        }
    }

    /// The durable image, as of the last successful commit.
    pub fn committed(&self) -> &[u8] {
        &self.committed
    }

    /// The staged image, including uncommitted writes.
    pub fn staged(&self) -> &[u8] {
        &self.staged
    }

    /// Drops every uncommitted write, as a reset would.
    pub fn power_cycle(&mut self) {
        self.staged.copy_from_slice(&self.committed);
    }

    /// Makes the next `count` commits fail.
    pub fn fail_next_commits(&mut self, count: usize) {
        self.failing_commits = count;
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> u64 {
        self.commit_count
    }
}

impl StorageMedium for MemoryMedium {
    fn capacity(&self) -> usize {
        self.staged.len()
    }

    fn max_capacity(&self) -> usize {
        Self::MAX_CAPACITY
    }

    fn read_byte(&self, offset: usize) -> Result<u8> {
        self.staged
            .get(offset)
            .copied()
            .ok_or(CellError::OutOfBounds {
                offset,
                capacity: self.staged.len(),
            })
    }

    fn write_byte(&mut self, offset: usize, byte: u8) -> Result<()> {
        let capacity = self.staged.len();
        let cell = self
            .staged
            .get_mut(offset)
            .ok_or(CellError::OutOfBounds { offset, capacity })?;
        *cell = byte;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.failing_commits > 0 {
            self.failing_commits -= 1;
            return Err(CellError::CommitFailed(
                "EEPROM commit refused".to_string(),
            ));
        }

        self.committed.copy_from_slice(&self.staged);
        self.commit_count += 1;
        Ok(())
    }

    fn read_range(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        check_range(self.staged.len(), offset, len)?;
        Ok(self.staged[offset..offset + len].to_vec())
    }

    fn write_all_at(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        check_range(self.staged.len(), offset, data.len())?;
        self.staged[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn fill(&mut self, byte: u8) -> Result<()> {
        self.staged.fill(byte);
        Ok(())
    }
}
