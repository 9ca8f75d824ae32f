//! Property-set section list, section header and per-section property
//! list, spec.md §4.8.

use crate::directory::format_class_id_bytes;
use crate::endian::ByteOrder;
use crate::error::{Error, Kind};
use crate::Result;

pub const SECTION_LIST_ENTRY_LEN: usize = 20;
pub const SECTION_HEADER_LEN: usize = 8;
pub const PROPERTY_LIST_ENTRY_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct SectionListEntry {
    pub class_id: Option<String>,
    /// Offset of this section's header, from the start of the property-set
    /// stream.
    pub offset: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct SectionHeader {
    pub data_size: u32,
    pub number_of_properties: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct PropertyListEntry {
    pub property_id: u32,
    /// Offset of this property's payload, relative to its section's header.
    pub payload_offset: u32,
}

pub fn parse_section_list(
    stream: &[u8],
    offset: usize,
    count: u32,
    byte_order: ByteOrder,
) -> Result<Vec<SectionListEntry>> {
    let mut out = Vec::with_capacity(count as usize);
    for i in 0..count as usize {
        let start = offset + i * SECTION_LIST_ENTRY_LEN;
        let end = start + SECTION_LIST_ENTRY_LEN;
        let chunk = slice_or_err(stream, start, end, "section list entry")?;
        out.push(SectionListEntry {
            class_id: format_class_id_bytes(&chunk[0..16], byte_order),
            offset: byte_order.read_u32(&chunk[16..20]),
        });
    }
    Ok(out)
}

pub fn parse_section_header(
    stream: &[u8],
    offset: usize,
    byte_order: ByteOrder,
) -> Result<SectionHeader> {
    let chunk = slice_or_err(stream, offset, offset + SECTION_HEADER_LEN, "section header")?;
    Ok(SectionHeader {
        data_size: byte_order.read_u32(&chunk[0..4]),
        number_of_properties: byte_order.read_u32(&chunk[4..8]),
    })
}

pub fn parse_property_list(
    stream: &[u8],
    offset: usize,
    count: u32,
    byte_order: ByteOrder,
) -> Result<Vec<PropertyListEntry>> {
    let mut out = Vec::with_capacity(count as usize);
    for i in 0..count as usize {
        let start = offset + i * PROPERTY_LIST_ENTRY_LEN;
        let end = start + PROPERTY_LIST_ENTRY_LEN;
        let chunk = slice_or_err(stream, start, end, "property list entry")?;
        out.push(PropertyListEntry {
            property_id: byte_order.read_u32(&chunk[0..4]),
            payload_offset: byte_order.read_u32(&chunk[4..8]),
        });
    }
    Ok(out)
}

pub(crate) fn slice_or_err<'a>(
    buf: &'a [u8],
    start: usize,
    end: usize,
    what: &str,
) -> Result<&'a [u8]> {
    buf.get(start..end).ok_or_else(|| {
        Error::input(
            Kind::ValueOutOfBounds,
            format!("property set {what} at {start}..{end} is out of bounds"),
        )
    })
}
