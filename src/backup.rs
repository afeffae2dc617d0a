//! Backup Module
//!
//! Portable snapshots of the live key-value pairs.
//!
//! A failed insert or compaction can leave the log in an unknown state; the
//! way back is to format the medium and reload from a snapshot taken
//! earlier.
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────┬─────────────┐
//! │ bincode(Backup)              │ CRC32 (4)   │
//! └──────────────────────────────┴─────────────┘
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::accountant::SizeAccountant;
use crate::error::{CellError, Result};
use crate::medium::StorageMedium;
use crate::store::Store;

/// Snapshot format version
const BACKUP_VERSION: u16 = 1;

/// CRC32 footer size
const FOOTER_SIZE: usize = 4;

/// Live key-value pairs of a store, in log order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backup {
    version: u16,
    /// Capacity of the medium the snapshot was taken from
    pub source_capacity: u64,
    pub entries: Vec<(String, String)>,
}

impl Backup {
    /// Snapshot every live pair of `store`
    pub fn capture<M: StorageMedium, A: SizeAccountant>(store: &Store<M, A>) -> Result<Self> {
        let entries = store.entries()?;
        info!(entries = entries.len(), "Captured backup");
        Ok(Self {
            version: BACKUP_VERSION,
            source_capacity: store.capacity() as u64,
            entries,
        })
    }

    /// Number of pairs in the snapshot
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize with a CRC32 footer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = bincode::serialize(self)?;
        let crc = crc32fast::hash(&bytes);
        bytes.extend_from_slice(&crc.to_le_bytes());
        Ok(bytes)
    }

    /// Inverse of [`Backup::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FOOTER_SIZE {
            return Err(CellError::BackupCorrupted("truncated".to_string()));
        }

        let (body, footer) = bytes.split_at(bytes.len() - FOOTER_SIZE);
        let mut crc = [0u8; FOOTER_SIZE];
        crc.copy_from_slice(footer);
        let expected = u32::from_le_bytes(crc);
        let found = crc32fast::hash(body);
        if expected != found {
            return Err(CellError::BackupCorrupted(format!(
                "checksum mismatch: expected {:#010x}, found {:#010x}",
                expected, found
            )));
        }

        let backup: Backup = bincode::deserialize(body)?;
        if backup.version != BACKUP_VERSION {
            return Err(CellError::BackupCorrupted(format!(
                "unsupported backup version: {}",
                backup.version
            )));
        }
        Ok(backup)
    }

    /// Write the snapshot to `path`
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Read a snapshot from `path`
    pub fn read_from(path: &Path) -> Result<Self> {
        Self::from_bytes(&fs::read(path)?)
    }

    /// Format `store` and insert every pair
    ///
    /// Stops at the first failing insert (`MemoryFull` included); the pairs
    /// inserted so far stay in the store.
    pub fn restore_into<M: StorageMedium, A: SizeAccountant>(
        &self,
        store: &mut Store<M, A>,
    ) -> Result<()> {
        store.format()?;

        for (i, (key, value)) in self.entries.iter().enumerate() {
            if let Err(e) = store.insert(key, value) {
                warn!(restored = i, total = self.entries.len(), error = %e, "Restore stopped");
                return Err(e);
            }
        }

        info!(entries = self.entries.len(), "Restored backup");
        Ok(())
    }
}
