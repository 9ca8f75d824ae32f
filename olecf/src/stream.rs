//! L5: stream content, spec.md §4.7.
//!
//! A stream's bytes live in one of two places depending on its size versus
//! `sector_stream_minimum_data_size` (4096 by default): smaller streams are
//! packed into the mini-stream, addressed through the SSAT in
//! `short_sector_size` (64-byte) units; everything else is addressed
//! through the ordinary SAT in full sectors. Both are simple chains, so the
//! two paths share the allocation module's chain walkers and differ only in
//! which table and unit size they use.

use crate::allocation::{read_chain, read_short_chain};
use crate::block_source::BlockSource;
use crate::directory::DirectoryEntry;
use crate::header::OleHeader;
use crate::Result;

/// Reads the full contents of a stream entry, truncated to its recorded
/// size (trailing sector padding is never meaningful content).
pub fn read_stream_data(
    source: &mut dyn BlockSource,
    header: &OleHeader,
    sat: &[u32],
    ssat: &[u32],
    mini_stream: &[u8],
    entry: &DirectoryEntry,
) -> Result<Vec<u8>> {
    let mut data = if entry.size < header.sector_stream_minimum_data_size as u64 {
        read_short_chain(mini_stream, header.short_sector_size, ssat, entry.starting_sector)?
    } else {
        read_chain(source, header, sat, entry.starting_sector)?
    };

    let size = entry.size as usize;
    if data.len() > size {
        data.truncate(size);
    } else if data.len() < size {
        log::warn!(
            "stream '{}' claims {} bytes but its chain only yielded {}, padding with zeros",
            entry.name,
            size,
            data.len()
        );
        data.resize(size, 0);
    }

    Ok(data)
}

/// Reads the root storage's mini-stream: an ordinary stream, chained
/// through the SAT starting at the root entry's own `starting_sector`,
/// whose content is itself interpreted as short sectors by every other
/// stream entry below the mini-stream threshold.
pub fn read_mini_stream(
    source: &mut dyn BlockSource,
    header: &OleHeader,
    sat: &[u32],
    root: &DirectoryEntry,
) -> Result<Vec<u8>> {
    if root.starting_sector == crate::constants::SID_FREE || root.size == 0 {
        return Ok(Vec::new());
    }
    let mut data = read_chain(source, header, sat, root.starting_sector)?;
    let size = root.size as usize;
    if data.len() > size {
        data.truncate(size);
    }
    Ok(data)
}

/// POSIX `lseek`-like resolution of a new stream position: `SET`/`CUR`/`END`
/// whence, as spec.md §6 requires ("reject negative, allow seek past EOF").
#[derive(Debug, Clone, Copy)]
pub enum SeekFrom {
    Start(u64),
    Current(i64),
    End(i64),
}

pub fn resolve_seek(current: u64, len: u64, from: SeekFrom) -> Result<u64> {
    let base: i128 = match from {
        SeekFrom::Start(n) => n as i128,
        SeekFrom::Current(delta) => current as i128 + delta as i128,
        SeekFrom::End(delta) => len as i128 + delta as i128,
    };
    if base < 0 {
        return Err(crate::error::Error::input(
            crate::error::Kind::ValueOutOfBounds,
            "seek would move to a negative offset",
        ));
    }
    if base > i64::MAX as i128 {
        return Err(crate::error::Error::input(
            crate::error::Kind::ValueExceedsMaximum,
            "seek offset exceeds INT64_MAX",
        ));
    }
    Ok(base as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seek_from_start() {
        assert_eq!(resolve_seek(10, 100, SeekFrom::Start(5)).unwrap(), 5);
    }

    #[test]
    fn seek_past_eof_is_allowed() {
        assert_eq!(resolve_seek(10, 100, SeekFrom::End(50)).unwrap(), 150);
    }

    #[test]
    fn seek_negative_is_rejected() {
        assert!(resolve_seek(10, 100, SeekFrom::Current(-20)).is_err());
    }

    #[test]
    fn seek_to_int64_max_is_allowed_but_beyond_it_is_rejected() {
        assert_eq!(
            resolve_seek(0, 0, SeekFrom::Start(i64::MAX as u64)).unwrap(),
            i64::MAX as u64
        );
        assert!(resolve_seek(0, 0, SeekFrom::Start(i64::MAX as u64 + 1)).is_err());
    }
}
