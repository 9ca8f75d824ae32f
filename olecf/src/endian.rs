//! Centralised endian-sensitive integer reads, spec.md §9 Design Notes
//! ("Endian-sensitive reads"). Every multi-byte field in the container is
//! decoded through one of these, rather than each parser choosing
//! little/big-endian conversions ad hoc. Built on the `byteorder` crate's
//! `ByteOrder` trait, the same way `rust-cfb`-style sync CFB readers do.

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

/// Byte order in effect for a single open OLECF file, fixed by the 2-byte
/// marker at header offset `0x1C` and applying uniformly to every
/// subsequent integer field, spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub fn read_u16(self, buf: &[u8]) -> u16 {
        match self {
            ByteOrder::Little => LittleEndian::read_u16(buf),
            ByteOrder::Big => BigEndian::read_u16(buf),
        }
    }

    pub fn read_u32(self, buf: &[u8]) -> u32 {
        match self {
            ByteOrder::Little => LittleEndian::read_u32(buf),
            ByteOrder::Big => BigEndian::read_u32(buf),
        }
    }

    pub fn read_u64(self, buf: &[u8]) -> u64 {
        match self {
            ByteOrder::Little => LittleEndian::read_u64(buf),
            ByteOrder::Big => BigEndian::read_u64(buf),
        }
    }

    pub fn read_i64(self, buf: &[u8]) -> i64 {
        self.read_u64(buf) as i64
    }

    /// Decodes a run of `u32` sector identifiers packed back to back.
    pub fn read_u32_array(self, buf: &[u8]) -> Vec<u32> {
        buf.chunks_exact(4).map(|chunk| self.read_u32(chunk)).collect()
    }
}
