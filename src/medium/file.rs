//! File-backed medium for persistent storage.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CellError, Result};
use crate::record::TERMINATOR;

use super::{check_range, StorageMedium};

/// A single file presenting a fixed-capacity byte region.
///
/// The file is sized to the capacity when opened: a new or short file is
/// extended with terminator filler, so a freshly created file already reads
/// as an empty log. Every write goes straight to the file; `commit` flushes
/// and syncs the file data to disk.
///
/// # Example
///
/// ```no_run
/// use cellkv::medium::{FileMedium, StorageMedium};
/// use std::path::Path;
///
/// let mut medium = FileMedium::open(Path::new("store.txt"), 1024).unwrap();
/// medium.write_all_at(0, b"k>1:v\n").unwrap();
/// medium.commit().unwrap();
/// ```
#[derive(Debug)]
pub struct FileMedium {
    path: PathBuf,
    file: File,
    capacity: usize,
}

impl FileMedium {
    /// Largest file region supported (in bytes)
    pub const MAX_CAPACITY: usize = 10 * 1024;

    /// Opens or creates the file at `path` with `capacity` bytes.
    ///
    /// Existing contents are preserved. A file shorter than `capacity` is
    /// padded with terminators.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, cannot be extended, or
    /// is already larger than `capacity`.
    pub fn open(path: &Path, capacity: usize) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let len = file.metadata()?.len() as usize;
        if len > capacity {
            return Err(CellError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "{} holds {} bytes, more than the requested capacity {}",
                    path.display(),
                    len,
                    capacity
                ),
            )));
        }

        if len < capacity {
            debug!(path = %path.display(), from = len, to = capacity, "Extending medium file");
            file.seek(SeekFrom::Start(len as u64))?;
            file.write_all(&vec![TERMINATOR; capacity - len])?;
            file.sync_all()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            capacity,
        })
    }

    /// Opens or creates the file, creating parent directories if needed.
    pub fn open_with_create_dirs(path: &Path, capacity: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path, capacity)
    }

    /// Returns the path to the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageMedium for FileMedium {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn max_capacity(&self) -> usize {
        Self::MAX_CAPACITY
    }

    fn read_byte(&self, offset: usize) -> Result<u8> {
        Ok(self.read_range(offset, 1)?[0])
    }

    fn write_byte(&mut self, offset: usize, byte: u8) -> Result<()> {
        self.write_all_at(offset, &[byte])
    }

    fn commit(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }

    fn read_range(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        check_range(self.capacity, offset, len)?;

        // `&File` implements Read + Seek, so shared access is enough
        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset as u64))?;
        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn write_all_at(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        check_range(self.capacity, offset, data.len())?;
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.write_all(data)?;
        Ok(())
    }

    fn fill(&mut self, byte: u8) -> Result<()> {
        self.write_all_at(0, &vec![byte; self.capacity])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_create_new_is_padded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.txt");

        let medium = FileMedium::open(&path, 32).unwrap();

        assert_eq!(medium.capacity(), 32);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 32);
        assert!(medium.read_range(0, 32).unwrap().iter().all(|&b| b == TERMINATOR));
    }

    #[test]
    fn file_write_and_read_byte() {
        let dir = tempdir().unwrap();
        let mut medium = FileMedium::open(&dir.path().join("store.txt"), 16).unwrap();

        medium.write_byte(3, b'x').unwrap();

        assert_eq!(medium.read_byte(3).unwrap(), b'x');
        assert_eq!(medium.read_byte(4).unwrap(), TERMINATOR);
    }

    #[test]
    fn file_read_past_end_fails() {
        let dir = tempdir().unwrap();
        let medium = FileMedium::open(&dir.path().join("store.txt"), 16).unwrap();

        assert!(matches!(
            medium.read_byte(16),
            Err(CellError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn file_oversized_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.txt");
        std::fs::write(&path, vec![b'a'; 64]).unwrap();

        assert!(FileMedium::open(&path, 16).is_err());
    }

    #[test]
    fn file_open_with_create_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("store.txt");

        let medium = FileMedium::open_with_create_dirs(&path, 8).unwrap();

        assert!(path.exists());
        assert_eq!(medium.path(), path.as_path());
    }
}
