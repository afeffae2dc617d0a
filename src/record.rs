//! Record Codec
//!
//! Serializes one key-value record to and from the log's line format.
//!
//! ## Line Format
//! ```text
//! ┌───────────┬─────┬──────────┬─────┬─────────────┬──────┐
//! │ Key (var) │ '>' │ Flag (1) │ ':' │ Value (var) │ '\n' │
//! └───────────┴─────┴──────────┴─────┴─────────────┴──────┘
//!   Flag: '1' = alive, '0' = tombstone
//! ```
//!
//! The format is text, one record per line, and must stay byte-exact:
//! existing media written by earlier firmware are read back as-is.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CellError, Result};
use crate::medium::StorageMedium;

// =============================================================================
// Wire Constants
// =============================================================================

/// Separates the key from the alive flag
pub const KEY_SEPARATOR: u8 = b'>';

/// Separates the alive flag from the value
pub const VALUE_SEPARATOR: u8 = b':';

/// Ends a record; unused capacity is filled with it
pub const TERMINATOR: u8 = b'\n';

/// Alive flag of a live record
pub const ALIVE: u8 = b'1';

/// Alive flag of a tombstoned record
pub const TOMBSTONE: u8 = b'0';

/// Bytes a record adds on top of its key and value: '>', flag, ':', '\n'
pub const RECORD_OVERHEAD: usize = 4;

const RESERVED: [u8; 3] = [KEY_SEPARATOR, VALUE_SEPARATOR, TERMINATOR];

// =============================================================================
// Record
// =============================================================================

/// One decoded log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub value: String,
    pub alive: bool,
}

impl Record {
    /// Create a live record
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            alive: true,
        }
    }

    /// Size of the encoded line, terminator included
    pub fn encoded_len(key: &str, value: &str) -> usize {
        key.len() + value.len() + RECORD_OVERHEAD
    }

    /// Reject keys and values containing a reserved delimiter
    pub fn validate(key: &str, value: &str) -> Result<()> {
        for (what, text) in [("key", key), ("value", value)] {
            if let Some(b) = text.bytes().find(|b| RESERVED.contains(b)) {
                return Err(CellError::InvalidRecord(format!(
                    "{} {:?} contains reserved byte {:?}",
                    what, text, b as char
                )));
            }
        }
        Ok(())
    }

    /// Encode a live record: `key>1:value\n`
    pub fn encode(key: &str, value: &str) -> Result<Bytes> {
        Self::validate(key, value)?;
        Ok(Self::encode_unchecked(key, value, true))
    }

    /// Encode this record with its current alive flag
    pub fn to_bytes(&self) -> Result<Bytes> {
        Self::validate(&self.key, &self.value)?;
        Ok(Self::encode_unchecked(&self.key, &self.value, self.alive))
    }

    fn encode_unchecked(key: &str, value: &str, alive: bool) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::encoded_len(key, value));
        buf.put_slice(key.as_bytes());
        buf.put_u8(KEY_SEPARATOR);
        buf.put_u8(if alive { ALIVE } else { TOMBSTONE });
        buf.put_u8(VALUE_SEPARATOR);
        buf.put_slice(value.as_bytes());
        buf.put_u8(TERMINATOR);
        buf.freeze()
    }

    /// Decode the record starting at `offset`
    ///
    /// Returns the record and the offset just past its terminator.
    pub fn decode<M: StorageMedium + ?Sized>(medium: &M, offset: usize) -> Result<(Self, usize)> {
        let capacity = medium.capacity();
        let mut line = Vec::new();
        let mut pos = offset;

        loop {
            if pos >= capacity {
                return Err(CellError::MalformedRecord {
                    offset,
                    reason: "record runs past the end of the medium".to_string(),
                });
            }
            let byte = medium.read_byte(pos)?;
            pos += 1;
            if byte == TERMINATOR {
                break;
            }
            line.push(byte);
        }

        Ok((Self::parse_line(&line, offset)?, pos))
    }

    /// Parse one line (without its terminator) that started at `offset`
    pub fn parse_line(line: &[u8], offset: usize) -> Result<Self> {
        let malformed = |reason: &str| CellError::MalformedRecord {
            offset,
            reason: reason.to_string(),
        };

        let sep = line
            .iter()
            .position(|&b| b == KEY_SEPARATOR)
            .ok_or_else(|| malformed("missing key separator"))?;

        let alive = match line.get(sep + 1) {
            Some(&ALIVE) => true,
            Some(&TOMBSTONE) => false,
            Some(_) => return Err(malformed("invalid alive flag")),
            None => return Err(malformed("missing alive flag")),
        };

        if line.get(sep + 2) != Some(&VALUE_SEPARATOR) {
            return Err(malformed("missing value separator"));
        }

        let key = std::str::from_utf8(&line[..sep]).map_err(|_| malformed("key is not UTF-8"))?;
        let value =
            std::str::from_utf8(&line[sep + 3..]).map_err(|_| malformed("value is not UTF-8"))?;

        Ok(Self {
            key: key.to_string(),
            value: value.to_string(),
            alive,
        })
    }

    /// Offset of the alive flag of a record starting at `offset`
    pub fn alive_flag_offset(offset: usize, key: &str) -> usize {
        offset + key.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::MemoryMedium;

    #[test]
    fn encode_layout() {
        let bytes = Record::encode("temp", "21.5").unwrap();
        assert_eq!(&bytes[..], b"temp>1:21.5\n");
        assert_eq!(bytes.len(), Record::encoded_len("temp", "21.5"));
    }

    #[test]
    fn encode_tombstone_flag() {
        let mut record = Record::new("k", "v");
        record.alive = false;
        assert_eq!(&record.to_bytes().unwrap()[..], b"k>0:v\n");
    }

    #[test]
    fn decode_reports_next_offset() {
        let medium = MemoryMedium::with_data(b"a>1:1\nb>0:22\n\n\n".to_vec());

        let (first, next) = Record::decode(&medium, 0).unwrap();
        assert_eq!(first, Record::new("a", "1"));
        assert_eq!(next, 6);

        let (second, next) = Record::decode(&medium, next).unwrap();
        assert_eq!(second.key, "b");
        assert_eq!(second.value, "22");
        assert!(!second.alive);
        assert_eq!(next, 13);
    }

    #[test]
    fn decode_without_terminator_is_malformed() {
        let medium = MemoryMedium::with_data(b"a>1:1".to_vec());
        assert!(matches!(
            Record::decode(&medium, 0),
            Err(CellError::MalformedRecord { offset: 0, .. })
        ));
    }

    #[test]
    fn parse_line_rejects_missing_separators() {
        assert!(Record::parse_line(b"no separators", 0).is_err());
        assert!(Record::parse_line(b"k>1value", 0).is_err());
        assert!(Record::parse_line(b"k>", 0).is_err());
        assert!(Record::parse_line(b"k>x:v", 0).is_err());
    }

    #[test]
    fn empty_key_and_value_are_allowed() {
        let bytes = Record::encode("", "").unwrap();
        assert_eq!(&bytes[..], b">1:\n");
        assert_eq!(Record::parse_line(b">1:", 0).unwrap(), Record::new("", ""));
    }

    #[test]
    fn alive_flag_offset_points_past_key_separator() {
        assert_eq!(Record::alive_flag_offset(10, "abc"), 14);
    }
}
