//! Block file
//!
//! Thin positioned I/O over the tree's backing file.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::Result;
use crate::GeneBankError;

/// Backing file accessed by absolute byte offset
pub struct BlockFile {
    /// Open handle
    file: File,
    /// Writes are refused when set
    read_only: bool,
}

impl BlockFile {
    /// Create (or truncate) a file and size it to `len` bytes
    pub fn create(path: &Path, len: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        file.set_len(len)?;

        Ok(Self {
            file,
            read_only: false,
        })
    }

    /// Open an existing file
    pub fn open(path: &Path, read_only: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(!read_only)
            .open(path)?;

        Ok(Self {
            file,
            read_only,
        })
    }

    /// Current file length in bytes
    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Fill `buf` from `offset`
    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    /// Write `data` at `offset`, growing the file first if the block lies past the end
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        if self.read_only {
            return Err(GeneBankError::ReadOnly);
        }

        let end = offset + data.len() as u64;
        if self.len()? < end {
            self.file.set_len(end)?;
        }

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)?;
        Ok(())
    }

    /// Force written data to disk
    pub fn sync(&mut self) -> Result<()> {
        if !self.read_only {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Whether writes are refused
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}
