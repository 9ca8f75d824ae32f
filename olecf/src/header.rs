//! L2: file header parser, spec.md §4.2/§6.

use crate::block_source::BlockSource;
use crate::endian::ByteOrder;
use crate::constants::*;
use crate::error::{Domain, Error, Kind};
use crate::Result;

/// Parsed, semantic form of the fixed 512-byte OLECF header.
#[derive(Debug, Clone)]
pub struct OleHeader {
    pub byte_order: ByteOrder,
    pub major_version: u16,
    pub minor_version: u16,
    pub sector_shift: u16,
    pub short_sector_shift: u16,
    pub sector_size: u32,
    pub short_sector_size: u32,
    pub number_of_sat_sectors: u32,
    pub root_directory_sector_identifier: u32,
    pub sector_stream_minimum_data_size: u32,
    pub ssat_sector_identifier: u32,
    pub number_of_ssat_sectors: u32,
    pub msat_sector_identifier: u32,
    pub number_of_msat_sectors: u32,
    /// The first 109 MSAT entries, embedded directly in the header.
    pub msat_head: Vec<u32>,
}

impl OleHeader {
    /// Converts a sector identifier to its backing-store byte offset, per
    /// spec.md §3: "the +1 skips the header sector".
    pub fn sector_offset(&self, sid: u32) -> u64 {
        (sid as u64 + 1) * self.sector_size as u64
    }
}

/// Parses and validates the 512-byte header at offset 0 of `source`,
/// spec.md §4.2.
pub fn parse_header(source: &mut dyn BlockSource) -> Result<OleHeader> {
    let mut buf = [0u8; HEADER_LEN];
    source.read_exact_at(0, &mut buf)?;

    let signature = &buf[0x00..0x08];
    if signature == MAGIC_BYTES {
        // canonical, little-endian signature; byte order confirmed below
    } else if signature == MAGIC_BYTES_BETA {
        // beta signature; still confirmed via the byte-order marker below
    } else {
        return Err(Error::runtime(Kind::UnsupportedValue, "invalid file signature"));
    }

    let byte_order_marker = u16::from_le_bytes([buf[0x1C], buf[0x1D]]);
    let byte_order_marker_be = u16::from_be_bytes([buf[0x1C], buf[0x1D]]);
    let byte_order = if byte_order_marker == BYTE_ORDER_LITTLE {
        ByteOrder::Little
    } else if byte_order_marker_be == BYTE_ORDER_BIG || byte_order_marker == BYTE_ORDER_BIG {
        ByteOrder::Big
    } else {
        return Err(Error::new(
            Domain::Input,
            Kind::UnsupportedValue,
            format!("unsupported byte order marker: {:04x}", byte_order_marker),
        ));
    };

    let minor_version = byte_order.read_u16(&buf[0x18..0x1A]);
    let major_version = byte_order.read_u16(&buf[0x1A..0x1C]);

    let sector_shift = byte_order.read_u16(&buf[0x1E..0x20]);
    let short_sector_shift = byte_order.read_u16(&buf[0x20..0x22]);
    if sector_shift > 15 || short_sector_shift > 15 {
        return Err(Error::runtime(
            Kind::ValueExceedsMaximum,
            "sector shift exceeds maximum of 15",
        ));
    }
    let sector_size = 1u32 << sector_shift;
    let short_sector_size = 1u32 << short_sector_shift;

    let number_of_sat_sectors = byte_order.read_u32(&buf[0x2C..0x30]);
    let root_directory_sector_identifier = byte_order.read_u32(&buf[0x30..0x34]);
    let sector_stream_minimum_data_size = byte_order.read_u32(&buf[0x38..0x3C]);
    let ssat_sector_identifier = byte_order.read_u32(&buf[0x3C..0x40]);
    let number_of_ssat_sectors = byte_order.read_u32(&buf[0x40..0x44]);
    let msat_sector_identifier = byte_order.read_u32(&buf[0x44..0x48]);
    let number_of_msat_sectors = byte_order.read_u32(&buf[0x48..0x4C]);

    let mut msat_head = byte_order.read_u32_array(&buf[0x4C..0x200]);
    msat_head.resize(SIZE_OF_MSAT_HEAD_ENTRIES, SID_FREE);

    Ok(OleHeader {
        byte_order,
        major_version,
        minor_version,
        sector_shift,
        short_sector_shift,
        sector_size,
        short_sector_size,
        number_of_sat_sectors,
        root_directory_sector_identifier,
        sector_stream_minimum_data_size,
        ssat_sector_identifier,
        number_of_ssat_sectors,
        msat_sector_identifier,
        number_of_msat_sectors,
        msat_head,
    })
}
