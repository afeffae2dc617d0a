//! Size Accountant
//!
//! Answers "where does the log end?" for a medium.
//!
//! The line format carries no length header, so the end of the log has to
//! be inferred from the filler that follows it. [`TerminatorRun`] does this
//! with a run of terminator bytes, which is fragile: any future format that
//! allows several consecutive terminators inside the data breaks it. Callers
//! therefore go through the [`SizeAccountant`] trait and treat the answer as
//! an opaque "end of data" offset, so an accountant backed by an explicit
//! length field can replace this one without touching them.

use crate::error::Result;
use crate::medium::StorageMedium;
use crate::record::TERMINATOR;

/// Determines the logical end of the log on a medium
pub trait SizeAccountant {
    /// Offset of the first filler byte (bytes currently in use).
    ///
    /// Always `<= medium.capacity()`.
    fn used_bytes<M: StorageMedium + ?Sized>(&self, medium: &M) -> Result<usize>;
}

/// End-of-log detection via a run of terminator bytes
///
/// The medium is scanned in aligned windows of `run_len` bytes; bytes past
/// the capacity count as terminators. The first window made only of
/// terminators marks the filler. A reverse scan from that window skips the
/// trailing terminators back to the last data byte `j`; the log then ends
/// at `j + 2`, just past the terminator of the last record.
///
/// Without such a window the same reverse scan runs from the end of the
/// medium, so a log whose filler is shorter than one window is still found.
/// A medium with data in its last byte is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminatorRun {
    run_len: usize,
}

impl TerminatorRun {
    pub fn new(run_len: usize) -> Self {
        Self {
            run_len: run_len.max(2),
        }
    }

    pub fn run_len(&self) -> usize {
        self.run_len
    }

    fn is_filler_window<M: StorageMedium + ?Sized>(&self, medium: &M, start: usize) -> Result<bool> {
        let capacity = medium.capacity();
        for offset in start..start + self.run_len {
            if offset < capacity && medium.read_byte(offset)? != TERMINATOR {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Default for TerminatorRun {
    fn default() -> Self {
        Self::new(3)
    }
}

impl SizeAccountant for TerminatorRun {
    fn used_bytes<M: StorageMedium + ?Sized>(&self, medium: &M) -> Result<usize> {
        let capacity = medium.capacity();

        let mut window = 0;
        while window < capacity {
            if self.is_filler_window(medium, window)? {
                return end_before(medium, window);
            }
            window += self.run_len;
        }

        // The last window can hold both the tail of the log and the filler
        end_before(medium, capacity)
    }
}

/// End of the log when everything from `limit` on is filler: skip back over
/// trailing terminators to the last data byte `j` and step past its
/// terminator.
fn end_before<M: StorageMedium + ?Sized>(medium: &M, limit: usize) -> Result<usize> {
    let capacity = medium.capacity();
    for j in (0..limit).rev() {
        if medium.read_byte(j)? != TERMINATOR {
            return Ok((j + 2).min(capacity));
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::MemoryMedium;

    fn medium_with(data: &[u8], capacity: usize) -> MemoryMedium {
        let mut bytes = vec![TERMINATOR; capacity];
        bytes[..data.len()].copy_from_slice(data);
        MemoryMedium::with_data(bytes)
    }

    #[test]
    fn empty_medium_uses_nothing() {
        let medium = medium_with(b"", 32);
        assert_eq!(TerminatorRun::default().used_bytes(&medium).unwrap(), 0);
    }

    #[test]
    fn end_lands_past_last_terminator() {
        let accountant = TerminatorRun::default();
        // Lengths chosen so the data ends at every window alignment
        for data in [&b"a>1:1\n"[..], b"ab>1:1\n", b"abc>1:1\n"] {
            let medium = medium_with(data, 32);
            assert_eq!(accountant.used_bytes(&medium).unwrap(), data.len());
        }
    }

    #[test]
    fn empty_value_record() {
        let medium = medium_with(b"a>1:\n", 32);
        assert_eq!(TerminatorRun::default().used_bytes(&medium).unwrap(), 5);
    }

    #[test]
    fn multiple_records() {
        let data = b"a>1:1\nb>0:22\nc>1:333\n";
        let medium = medium_with(data, 64);
        assert_eq!(TerminatorRun::default().used_bytes(&medium).unwrap(), data.len());
    }

    #[test]
    fn full_medium_without_filler() {
        let medium = MemoryMedium::new(16); // erased cells, no terminators
        assert_eq!(TerminatorRun::default().used_bytes(&medium).unwrap(), 16);
    }

    #[test]
    fn data_ending_at_capacity() {
        let data = b"key>1:value\n";
        let medium = medium_with(data, data.len());
        assert_eq!(TerminatorRun::default().used_bytes(&medium).unwrap(), data.len());
    }

    #[test]
    fn filler_shorter_than_a_window() {
        // 11 bytes of data, one filler byte: the last window is "1\n\n"
        let data = b"k>1:123456\n";
        let medium = medium_with(data, 12);
        assert_eq!(TerminatorRun::default().used_bytes(&medium).unwrap(), 11);
    }

    #[test]
    fn last_terminator_inside_final_window() {
        // One window of 12 covers the whole tail: 63 bytes of data, 9 of filler
        let data = format!("k>1:{}\n", "v".repeat(58));
        let medium = medium_with(data.as_bytes(), 72);
        assert_eq!(TerminatorRun::new(12).used_bytes(&medium).unwrap(), 63);
    }

    #[test]
    fn terminator_in_last_byte_is_full() {
        let data = b"k>1:1234567\n";
        let medium = medium_with(data, data.len());
        assert_eq!(TerminatorRun::new(5).used_bytes(&medium).unwrap(), data.len());
    }

    #[test]
    fn custom_run_length() {
        let data = b"a>1:1\nbb>1:2\n";
        let medium = medium_with(data, 40);
        for run in 2..=5 {
            assert_eq!(TerminatorRun::new(run).used_bytes(&medium).unwrap(), data.len());
        }
    }
}
