//! Compactor
//!
//! Rewrites the log keeping only live records.
//!
//! ## Algorithm
//! 1. Measure the log with the size accountant
//! 2. Unless forced, stop if the reserved bytes already fit
//! 3. Read the log into a scratch buffer and keep only live lines
//! 4. Erase the medium (terminator fill), write the survivors from 0, commit
//! 5. Re-read the rewritten region and check it against the survivors' CRC32
//! 6. Measure again; the reserved bytes must fit now or it's `MemoryFull`
//!
//! The rewrite happens in place. A failure between the erase and the commit
//! leaves the medium partially rewritten; callers must treat the log as
//! suspect after a failed compaction.

use bytes::{BufMut, BytesMut};
use tracing::{debug, info, warn};

use crate::accountant::SizeAccountant;
use crate::error::{CellError, Result};
use crate::medium::StorageMedium;
use crate::record::{Record, TERMINATOR};
use crate::scanner::split_lines;

/// Outcome of a compaction pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionReport {
    /// False when the fast path found enough room and nothing was rewritten
    pub rewritten: bool,
    /// Used bytes before compaction
    pub before: usize,
    /// Used bytes after compaction
    pub after: usize,
    /// Live records written back
    pub records_kept: usize,
    /// Tombstoned or malformed lines dropped
    pub records_dropped: usize,
}

impl CompactionReport {
    /// Bytes given back by the rewrite
    pub fn reclaimed(&self) -> usize {
        self.before.saturating_sub(self.after)
    }
}

/// Reclaims tombstoned space on a medium
pub struct Compactor<'a, M: StorageMedium + ?Sized, A: SizeAccountant> {
    medium: &'a mut M,
    accountant: &'a A,
    safety_margin: usize,
}

impl<'a, M: StorageMedium + ?Sized, A: SizeAccountant> Compactor<'a, M, A> {
    pub fn new(medium: &'a mut M, accountant: &'a A, safety_margin: usize) -> Self {
        Self {
            medium,
            accountant,
            safety_margin,
        }
    }

    /// Bytes usable by the log: capacity minus the safety margin
    fn limit(&self) -> usize {
        self.medium.capacity().saturating_sub(self.safety_margin)
    }

    /// Make room for `reserved` more bytes, rewriting the log if needed
    ///
    /// With `force` the log is rewritten even when the reserved bytes
    /// already fit.
    ///
    /// # Errors
    ///
    /// - [`CellError::MemoryFull`] if the reserved bytes still don't fit
    ///   after the rewrite
    /// - any medium error, commit failure or
    ///   [`CellError::RewriteVerification`] during the rewrite
    pub fn compact(&mut self, reserved: usize, force: bool) -> Result<CompactionReport> {
        let before = self.accountant.used_bytes(&*self.medium)?;
        let limit = self.limit();

        debug!(reserved, used = before, limit, force, "Checking space");

        if !force && reserved + before < limit {
            debug!("Sufficient space available, compaction not required");
            return Ok(CompactionReport {
                rewritten: false,
                before,
                after: before,
                records_kept: 0,
                records_dropped: 0,
            });
        }

        if force {
            info!(used = before, "Forced compaction");
        } else {
            info!(used = before, reserved, "Space low, compacting");
        }

        // Step 1: Collect the live lines into a scratch buffer
        let log = self.medium.read_range(0, before)?;
        let mut survivors = BytesMut::with_capacity(before);
        let mut records_kept = 0;
        let mut records_dropped = 0;

        for line in split_lines(&log) {
            if line.bytes.is_empty() {
                continue;
            }
            if !line.terminated {
                warn!(offset = line.offset, "Dropping unterminated tail");
                records_dropped += 1;
                continue;
            }
            match Record::parse_line(line.bytes, line.offset) {
                Ok(record) if record.alive => {
                    survivors.put_slice(line.bytes);
                    survivors.put_u8(TERMINATOR);
                    records_kept += 1;
                }
                Ok(_) => records_dropped += 1,
                Err(e) => {
                    warn!(error = %e, "Dropping malformed line");
                    records_dropped += 1;
                }
            }
        }

        let expected_crc = crc32fast::hash(&survivors);

        // Step 2: Erase and rewrite from offset 0
        self.medium.fill(TERMINATOR)?;
        self.medium.write_all_at(0, &survivors)?;
        if let Err(e) = self.medium.commit() {
            warn!(error = %e, "Commit failed during compaction, log integrity unknown");
            return Err(e);
        }

        // Step 3: Verify what actually landed on the medium
        let written = self.medium.read_range(0, survivors.len())?;
        let found_crc = crc32fast::hash(&written);
        if found_crc != expected_crc {
            warn!(expected_crc, found_crc, "Rewritten log does not match");
            return Err(CellError::RewriteVerification {
                expected: expected_crc,
                found: found_crc,
            });
        }

        // Step 4: Check the reserved bytes fit now
        let after = self.accountant.used_bytes(&*self.medium)?;
        info!(
            before,
            after,
            kept = records_kept,
            dropped = records_dropped,
            "Compaction finished"
        );

        if reserved + after > limit {
            warn!(reserved, used = after, limit, "Memory full");
            return Err(CellError::MemoryFull {
                required: reserved,
                available: limit.saturating_sub(after),
            });
        }

        Ok(CompactionReport {
            rewritten: true,
            before,
            after,
            records_kept,
            records_dropped,
        })
    }
}
