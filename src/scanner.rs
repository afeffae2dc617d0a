//! Scanner
//!
//! Linear search over the log.
//!
//! There is no index: every lookup walks the log from offset 0. With the
//! medium capped at a few kilobytes that is cheaper than keeping an index
//! in RAM, and it means the medium alone is the source of truth.
//!
//! A key may appear several times in the log until the next compaction
//! (older copies tombstoned). Tombstoned lines are skipped, never returned,
//! so a dead copy can't shadow the live one further down.

use tracing::trace;

use crate::error::{CellError, Result};
use crate::medium::StorageMedium;
use crate::record::{Record, ALIVE, KEY_SEPARATOR, TERMINATOR};

/// One line of the log, as sliced out of a scratch buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Line<'a> {
    /// Offset of the first byte of the line
    pub offset: usize,
    /// Line content, terminator excluded
    pub bytes: &'a [u8],
    /// False for a trailing fragment with no terminator
    pub terminated: bool,
}

/// Split a log image into lines
pub(crate) fn split_lines(log: &[u8]) -> impl Iterator<Item = Line<'_>> {
    let mut start = 0;
    std::iter::from_fn(move || {
        if start >= log.len() {
            return None;
        }
        let line = match log[start..].iter().position(|&b| b == TERMINATOR) {
            Some(len) => Line {
                offset: start,
                bytes: &log[start..start + len],
                terminated: true,
            },
            None => Line {
                offset: start,
                bytes: &log[start..],
                terminated: false,
            },
        };
        start += line.bytes.len() + 1;
        Some(line)
    })
}

/// Scans the log region `[0, end)` of a medium
pub struct Scanner<'a, M: StorageMedium + ?Sized> {
    medium: &'a M,
    end: usize,
}

impl<'a, M: StorageMedium + ?Sized> Scanner<'a, M> {
    /// Create a scanner over the first `end` bytes of `medium`
    pub fn new(medium: &'a M, end: usize) -> Self {
        Self {
            medium,
            end: end.min(medium.capacity()),
        }
    }

    /// Offset of the live record for `key`, if any
    ///
    /// Only the first `>` of a line delimits its key.
    pub fn find_key(&self, key: &str) -> Result<Option<usize>> {
        let log = self.medium.read_range(0, self.end)?;
        let target = key.as_bytes();

        let mut line_start = 0;
        let mut in_key = true;

        for (pos, &byte) in log.iter().enumerate() {
            if byte == TERMINATOR {
                line_start = pos + 1;
                in_key = true;
            } else if in_key && byte == KEY_SEPARATOR {
                in_key = false;
                if &log[line_start..pos] == target {
                    if log.get(pos + 1) == Some(&ALIVE) {
                        trace!(key, offset = line_start, "Key found");
                        return Ok(Some(line_start));
                    }
                    trace!(key, offset = line_start, "Skipping tombstoned copy");
                }
            }
        }

        trace!(key, "Key not found");
        Ok(None)
    }

    /// Every record in the log, in order, with its offset
    ///
    /// Tombstoned records are included. Fails on the first malformed line.
    pub fn records(&self) -> Result<Vec<(usize, Record)>> {
        let log = self.medium.read_range(0, self.end)?;

        split_lines(&log)
            .map(|line| {
                if !line.terminated {
                    return Err(CellError::MalformedRecord {
                        offset: line.offset,
                        reason: "missing terminator".to_string(),
                    });
                }
                Record::parse_line(line.bytes, line.offset).map(|r| (line.offset, r))
            })
            .collect()
    }

    /// Live records only, in log order
    pub fn live_records(&self) -> Result<Vec<(usize, Record)>> {
        Ok(self
            .records()?
            .into_iter()
            .filter(|(_, record)| record.alive)
            .collect())
    }
}
