//! L3: allocation tables -- MSAT, SAT and SSAT reconstruction, spec.md
//! §4.3/§4.4/§4.5.
//!
//! All three follow the same shape: a chain of sectors, each packed with
//! `sector_size / 4` little/big-endian `u32` entries, walked until
//! `SID_END_OF_CHAIN`. Cycles and runaway chains are tolerated rather than
//! hung on: both are logged and truncate the chain instead of failing the
//! whole open, per spec.md §4.3's "tolerate, don't propagate" stance on
//! malformed allocation metadata.

use std::collections::HashSet;

use crate::block_source::BlockSource;
use crate::constants::*;
use crate::error::{Error, Kind};
use crate::header::OleHeader;
use crate::Result;

/// Reads one full sector's raw bytes.
pub fn read_sector(source: &mut dyn BlockSource, header: &OleHeader, sid: u32) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; header.sector_size as usize];
    source.read_exact_at(header.sector_offset(sid), &mut buf)?;
    Ok(buf)
}

/// Reconstructs the full Master Sector Allocation Table: the 109 entries
/// embedded in the header, followed by any MSAT overflow sectors.
///
/// Per spec.md §4.3, an MSAT overflow sector holds `sector_size / 4 - 1` SAT
/// sector identifiers followed by the next MSAT sector identifier (or
/// `SID_END_OF_CHAIN`) in its final slot.
pub fn read_msat(source: &mut dyn BlockSource, header: &OleHeader) -> Result<Vec<u32>> {
    let mut msat = header.msat_head.clone();

    let mut next = header.msat_sector_identifier;
    let mut visited = HashSet::new();
    let mut depth = 0usize;

    while next != SID_END_OF_CHAIN && next != SID_FREE {
        if !visited.insert(next) {
            log::warn!("cyclic MSAT chain detected at sector {next}, truncating");
            break;
        }
        depth += 1;
        if depth > MAX_CHAIN_DEPTH {
            return Err(Error::runtime(
                Kind::ValueExceedsMaximum,
                "MSAT chain exceeds maximum depth",
            ));
        }

        let sector = read_sector(source, header, next)?;
        let entries = header.byte_order.read_u32_array(&sector);
        if entries.is_empty() {
            break;
        }
        let (sat_ids, tail) = entries.split_at(entries.len() - 1);
        msat.extend_from_slice(sat_ids);
        next = tail[0];
    }

    Ok(msat)
}

/// Reconstructs the Sector Allocation Table by reading every sector named in
/// `msat`, in order, skipping unused (`SID_FREE`) slots.
///
/// A slot identifying a sector whose own count was never bumped past zero is
/// tolerated (logged, not an error) per spec.md §4.3's note on the lenient
/// reader's handling of zero-count identifier sets.
pub fn read_sat(source: &mut dyn BlockSource, header: &OleHeader, msat: &[u32]) -> Result<Vec<u32>> {
    let mut sat = Vec::with_capacity(msat.len() * (header.sector_size as usize / 4));
    for &sid in msat {
        if sid == SID_FREE {
            continue;
        }
        let sector = read_sector(source, header, sid)?;
        sat.extend(header.byte_order.read_u32_array(&sector));
    }
    Ok(sat)
}

/// Reconstructs the Short-Sector Allocation Table by walking the SSAT
/// sector chain through the (already reconstructed) SAT, per spec.md §4.5:
/// "the SSAT chain is itself just an ordinary chain through the SAT, never
/// through itself".
pub fn read_ssat(source: &mut dyn BlockSource, header: &OleHeader, sat: &[u32]) -> Result<Vec<u32>> {
    let mut ssat = Vec::new();

    let mut next = header.ssat_sector_identifier;
    let mut visited = HashSet::new();
    let mut depth = 0usize;

    while next != SID_END_OF_CHAIN && next != SID_FREE {
        if !visited.insert(next) {
            log::warn!("cyclic SSAT chain detected at sector {next}, truncating");
            break;
        }
        depth += 1;
        if depth > MAX_CHAIN_DEPTH {
            return Err(Error::runtime(
                Kind::ValueExceedsMaximum,
                "SSAT chain exceeds maximum depth",
            ));
        }

        let sector = read_sector(source, header, next)?;
        ssat.extend(header.byte_order.read_u32_array(&sector));

        next = match sat.get(next as usize) {
            Some(&v) => v,
            None => {
                log::warn!("SSAT chain references sector {next} beyond SAT bounds, truncating");
                break;
            }
        };
    }

    Ok(ssat)
}

/// Walks an ordinary sector chain starting at `start`, concatenating every
/// sector's raw bytes, until `SID_END_OF_CHAIN`. Used for the directory
/// stream, the root storage's mini-stream, and any regular-sector stream.
pub fn read_chain(
    source: &mut dyn BlockSource,
    header: &OleHeader,
    sat: &[u32],
    start: u32,
) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut next = start;
    let mut visited = HashSet::new();
    let mut depth = 0usize;

    while next != SID_END_OF_CHAIN && next != SID_FREE {
        if !visited.insert(next) {
            log::warn!("cyclic sector chain detected at sector {next}, truncating");
            break;
        }
        depth += 1;
        if depth > MAX_CHAIN_DEPTH {
            return Err(Error::runtime(
                Kind::ValueExceedsMaximum,
                "sector chain exceeds maximum depth",
            ));
        }

        let sector = read_sector(source, header, next)?;
        data.extend_from_slice(&sector);

        next = match sat.get(next as usize) {
            Some(&v) => v,
            None => {
                log::warn!("sector chain references sector {next} beyond SAT bounds, truncating");
                break;
            }
        };
    }

    Ok(data)
}

/// Walks a short-sector (mini-stream) chain, reading `short_sector_size`
/// chunks out of the already-materialised mini-stream buffer rather than
/// from disk directly, per spec.md §4.7.
pub fn read_short_chain(
    mini_stream: &[u8],
    short_sector_size: u32,
    ssat: &[u32],
    start: u32,
) -> Result<Vec<u8>> {
    let short_sector_size = short_sector_size as usize;
    let mut data = Vec::new();
    let mut next = start;
    let mut visited = HashSet::new();
    let mut depth = 0usize;

    while next != SID_END_OF_CHAIN && next != SID_FREE {
        if !visited.insert(next) {
            log::warn!("cyclic mini-stream chain detected at short sector {next}, truncating");
            break;
        }
        depth += 1;
        if depth > MAX_CHAIN_DEPTH {
            return Err(Error::runtime(
                Kind::ValueExceedsMaximum,
                "mini-stream chain exceeds maximum depth",
            ));
        }

        let start_byte = next as usize * short_sector_size;
        let end_byte = start_byte + short_sector_size;
        if end_byte > mini_stream.len() {
            log::warn!("mini-stream chain references short sector {next} past end of mini-stream, truncating");
            break;
        }
        data.extend_from_slice(&mini_stream[start_byte..end_byte]);

        next = match ssat.get(next as usize) {
            Some(&v) => v,
            None => {
                log::warn!("mini-stream chain references short sector {next} beyond SSAT bounds, truncating");
                break;
            }
        };
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_source::MemoryBlockSource;
    use crate::header::parse_header;
    use crate::testutil::MinimalFileBuilder;

    #[test]
    fn reconstructs_sat_for_minimal_file() {
        let bytes = MinimalFileBuilder::new()
            .with_stream("small", vec![1u8; 100])
            .build();
        let mut source = MemoryBlockSource::new(bytes);
        let header = parse_header(&mut source).unwrap();
        let msat = read_msat(&mut source, &header).unwrap();
        let sat = read_sat(&mut source, &header, &msat).unwrap();
        assert!(!sat.is_empty());
    }

    #[test]
    fn reads_directory_chain() {
        let bytes = MinimalFileBuilder::new()
            .with_stream("small", vec![1u8; 100])
            .build();
        let mut source = MemoryBlockSource::new(bytes);
        let header = parse_header(&mut source).unwrap();
        let msat = read_msat(&mut source, &header).unwrap();
        let sat = read_sat(&mut source, &header, &msat).unwrap();
        let dir_bytes = read_chain(
            &mut source,
            &header,
            &sat,
            header.root_directory_sector_identifier,
        )
        .unwrap();
        assert!(dir_bytes.len() >= SIZE_OF_DIRECTORY_ENTRY * 2);
    }
}
