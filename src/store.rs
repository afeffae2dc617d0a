//! Store Module
//!
//! The facade that coordinates all components.
//!
//! ## Responsibilities
//! - Gate every operation behind `begin()`
//! - Locate records with the scanner and the size accountant
//! - Tombstone in place on remove and overwrite
//! - Trigger compaction when an insert would not fit
//! - Commit after every mutation

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::accountant::{SizeAccountant, TerminatorRun};
use crate::compactor::{CompactionReport, Compactor};
use crate::config::Config;
use crate::error::{CellError, Result};
use crate::medium::StorageMedium;
use crate::record::{Record, TERMINATOR, TOMBSTONE};
use crate::scanner::Scanner;

/// A log-structured key-value store over one storage medium
///
/// ## Lifecycle: `Uninitialized → Initialized`
///
/// A new store is uninitialized. `begin()` validates the medium and moves
/// it to initialized; until then every other operation fails with
/// [`CellError::NotInitialized`]. A fresh medium must also be formatted
/// before its first insert.
///
/// ## Access Model
///
/// Single caller, fully synchronous. Mutating operations take `&mut self`,
/// so the medium is never shared while it is being rewritten.
pub struct Store<M: StorageMedium, A: SizeAccountant = TerminatorRun> {
    /// Store configuration
    config: Config,

    /// The byte region holding the log
    medium: M,

    /// End-of-log detection
    accountant: A,

    /// Set by a successful begin()
    initialized: bool,
}

impl<M: StorageMedium> Store<M> {
    /// Create an uninitialized store with the default configuration
    pub fn new(medium: M) -> Self {
        Self::with_config(medium, Config::default())
    }

    /// Create an uninitialized store with the given configuration
    pub fn with_config(medium: M, config: Config) -> Self {
        let accountant = TerminatorRun::new(config.end_marker_run);
        Self::with_accountant(medium, config, accountant)
    }
}

impl<M: StorageMedium, A: SizeAccountant> Store<M, A> {
    /// Create an uninitialized store with a custom size accountant
    pub fn with_accountant(medium: M, config: Config, accountant: A) -> Self {
        Self {
            config,
            medium,
            accountant,
            initialized: false,
        }
    }

    /// Initialize the store
    ///
    /// The medium capacity must exceed the safety margin and stay within
    /// both the configured maximum and the medium's own limit.
    pub fn begin(&mut self) -> Result<()> {
        info!("Initializing store");

        let capacity = self.medium.capacity();
        let min = self.config.safety_margin + 1;
        let max = self.config.max_capacity.min(self.medium.max_capacity());

        if capacity < min || capacity > max {
            self.initialized = false;
            warn!(capacity, min, max, "Rejecting medium capacity");
            return Err(CellError::InvalidCapacity { capacity, min, max });
        }

        self.initialized = true;
        debug!(capacity, "Store initialized");
        Ok(())
    }

    /// Erase the whole medium (terminator fill) and commit
    pub fn format(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        info!(capacity = self.medium.capacity(), "Formatting medium");

        self.medium.fill(TERMINATOR)?;
        self.commit()
    }

    /// Compact the log now, even if there is room left
    pub fn optimize(&mut self) -> Result<CompactionReport> {
        self.ensure_initialized()?;
        self.compactor().compact(0, true)
    }

    /// Get the value for `key`, or `default` if there is no live record
    pub fn get(&self, key: &str, default: &str) -> Result<String> {
        self.ensure_initialized()?;
        debug!(key, "get");

        match self.find(key)? {
            Some(offset) => {
                let (record, _) = Record::decode(&self.medium, offset)?;
                Ok(record.value)
            }
            None => Ok(default.to_string()),
        }
    }

    /// Raw dump of the used log region, tombstones included
    pub fn get_all(&self) -> Result<Bytes> {
        self.ensure_initialized()?;
        let used = self.accountant.used_bytes(&self.medium)?;
        Ok(Bytes::from(self.medium.read_range(0, used)?))
    }

    /// Insert or overwrite `key`
    ///
    /// Steps:
    /// 1. Validate and encode the record
    /// 2. Tombstone the live copy, if any
    /// 3. Compact if the record would not fit
    /// 4. Append at the end of the log and commit
    ///
    /// On `MemoryFull` the previous value (if any) is appended back, so the
    /// store is unchanged for `key`. If that append fails too, the previous
    /// value is lost: the failure is logged and `MemoryFull` is still
    /// returned.
    pub fn insert(&mut self, key: &str, value: &str) -> Result<()> {
        self.ensure_initialized()?;
        debug!(key, "insert");

        // Step 1: Encode (rejects reserved delimiters before touching the medium)
        let data = Record::encode(key, value)?;

        // Step 2: Logical overwrite
        let previous = match self.find(key)? {
            Some(offset) => {
                let (record, _) = Record::decode(&self.medium, offset)?;
                self.tombstone(offset, key)?;
                Some(record)
            }
            None => None,
        };

        // Step 3: Make room
        let compacted = self.compactor().compact(data.len(), false);
        if let Err(e) = compacted {
            if let (true, Some(record)) = (e.is_memory_full(), previous) {
                debug!(key, "Restoring previous value after memory full");
                let restored = record.to_bytes().and_then(|data| self.append(&data));
                if let Err(restore_err) = restored {
                    warn!(key, error = %restore_err, "Previous value lost");
                }
            }
            return Err(e);
        }

        // Step 4: Append
        self.append(&data)
    }

    /// Tombstone the live record for `key`
    ///
    /// Fails with [`CellError::KeyNotFound`] if there is none.
    pub fn remove(&mut self, key: &str) -> Result<()> {
        self.ensure_initialized()?;
        debug!(key, "remove");

        match self.find(key)? {
            Some(offset) => self.tombstone(offset, key),
            None => {
                debug!(key, "Key not found");
                Err(CellError::KeyNotFound)
            }
        }
    }

    /// Whether `key` has a live record
    pub fn exists(&self, key: &str) -> Result<bool> {
        self.ensure_initialized()?;
        Ok(self.find(key)?.is_some())
    }

    /// Every live `(key, value)` pair, in log order
    pub fn entries(&self) -> Result<Vec<(String, String)>> {
        self.ensure_initialized()?;
        let used = self.accountant.used_bytes(&self.medium)?;

        Ok(Scanner::new(&self.medium, used)
            .live_records()?
            .into_iter()
            .map(|(_, record)| (record.key, record.value))
            .collect())
    }

    /// Bytes currently used by the log
    pub fn used_bytes(&self) -> Result<usize> {
        self.ensure_initialized()?;
        self.accountant.used_bytes(&self.medium)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            warn!("Store not initialized");
            Err(CellError::NotInitialized)
        }
    }

    fn find(&self, key: &str) -> Result<Option<usize>> {
        let used = self.accountant.used_bytes(&self.medium)?;
        Scanner::new(&self.medium, used).find_key(key)
    }

    fn compactor(&mut self) -> Compactor<'_, M, A> {
        Compactor::new(&mut self.medium, &self.accountant, self.config.safety_margin)
    }

    /// Flip the alive flag of the record at `offset` and commit
    fn tombstone(&mut self, offset: usize, key: &str) -> Result<()> {
        self.medium
            .write_byte(Record::alive_flag_offset(offset, key), TOMBSTONE)?;
        self.commit()
    }

    /// Write `data` at the end of the log and commit
    fn append(&mut self, data: &[u8]) -> Result<()> {
        let used = self.accountant.used_bytes(&self.medium)?;
        self.medium.write_all_at(used, data)?;
        self.commit()
    }

    fn commit(&mut self) -> Result<()> {
        self.medium.commit().map_err(|e| {
            warn!(error = %e, "Write operation failed");
            e
        })
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Whether begin() succeeded
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Capacity of the underlying medium
    pub fn capacity(&self) -> usize {
        self.medium.capacity()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    pub fn medium_mut(&mut self) -> &mut M {
        &mut self.medium
    }

    /// Release the medium
    pub fn into_medium(self) -> M {
        self.medium
    }
}
