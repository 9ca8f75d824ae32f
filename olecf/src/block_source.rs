//! L1: random-access byte reader, spec.md §4.1.
//!
//! A narrow interface -- `read_at` / `size` -- satisfied by a file, an
//! in-memory buffer, or (in principle) any other concatenated-segment
//! backend. The engine only ever issues positional reads so that several
//! `Item`s can share one `BlockSource` without external locking, per
//! spec.md §5.

use crate::error::{Domain, Error, Kind};
use crate::Result;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Random-access, positional-read byte source backing an open OLECF file.
///
/// Implementations must treat a short read as an error unless it occurs at
/// end of file, in which case they return the actual (shorter) byte count.
pub trait BlockSource {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    fn size(&mut self) -> Result<u64>;

    /// Reads exactly `buf.len()` bytes, failing if fewer are available
    /// (i.e. the read would have straddled EOF).
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let read = self.read_at(offset, buf)?;
        if read != buf.len() {
            return Err(Error::new(
                Domain::Io,
                Kind::InvalidData,
                format!(
                    "short read at offset {}: wanted {} bytes, got {}",
                    offset,
                    buf.len(),
                    read
                ),
            ));
        }
        Ok(())
    }
}

/// A file-backed block source. Rust's `Path`/`OsStr` already collapse the
/// narrow/wide filename distinction the original library exposes as two
/// separate opener functions, so there is only one `open`.
pub struct FileBlockSource {
    file: File,
    len: Option<u64>,
}

impl FileBlockSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io("unable to open file", e))?;
        Ok(FileBlockSource { file, len: None })
    }

    /// Adopts an already-open file handle (the "raw-handle adopter" variant
    /// from spec.md §4.1).
    pub fn from_file(file: File) -> Self {
        FileBlockSource { file, len: None }
    }
}

impl BlockSource for FileBlockSource {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| Error::io("unable to seek", e))?;
        let mut total = 0usize;
        while total < buf.len() {
            match self.file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) => return Err(Error::io("unable to read", e)),
            }
        }
        Ok(total)
    }

    fn size(&mut self) -> Result<u64> {
        if let Some(len) = self.len {
            return Ok(len);
        }
        let len = self
            .file
            .metadata()
            .map_err(|e| Error::io("unable to stat file", e))?
            .len();
        self.len = Some(len);
        Ok(len)
    }
}

/// In-memory block source, used for embedded use and for this crate's own
/// tests (synthetic OLECF byte buffers built without touching disk).
pub struct MemoryBlockSource {
    data: Vec<u8>,
}

impl MemoryBlockSource {
    pub fn new(data: Vec<u8>) -> Self {
        MemoryBlockSource { data }
    }
}

impl BlockSource for MemoryBlockSource {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let offset = offset as usize;
        if offset >= self.data.len() {
            return Ok(0);
        }
        let available = &self.data[offset..];
        let to_copy = available.len().min(buf.len());
        buf[..to_copy].copy_from_slice(&available[..to_copy]);
        Ok(to_copy)
    }

    fn size(&mut self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }
}
