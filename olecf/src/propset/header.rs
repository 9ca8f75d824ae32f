//! Property-set stream header, 28 bytes, spec.md §4.8.

use crate::constants::BYTE_ORDER_BIG;
use crate::constants::BYTE_ORDER_LITTLE;
use crate::directory::format_class_id_bytes;
use crate::endian::ByteOrder;
use crate::error::{Domain, Error, Kind};
use crate::Result;

pub const PROPERTY_SET_HEADER_LEN: usize = 28;

#[derive(Debug, Clone)]
pub struct PropertySetHeader {
    pub byte_order: ByteOrder,
    pub format: u16,
    pub system_version: u32,
    pub class_id: Option<String>,
    pub number_of_sections: u32,
}

/// Parses the 28-byte property-set header and confirms its byte-order
/// marker agrees with the containing OLECF file's, per spec.md §4.8.
pub fn parse_header(buf: &[u8], container_byte_order: ByteOrder) -> Result<PropertySetHeader> {
    if buf.len() < PROPERTY_SET_HEADER_LEN {
        return Err(Error::input(
            Kind::InvalidData,
            "property-set stream is shorter than its 28-byte header",
        ));
    }

    let marker = u16::from_le_bytes([buf[0], buf[1]]);
    let byte_order = if marker == BYTE_ORDER_LITTLE {
        ByteOrder::Little
    } else if marker == BYTE_ORDER_BIG {
        ByteOrder::Big
    } else {
        return Err(Error::input(
            Kind::UnsupportedValue,
            format!("unsupported property-set byte order marker: {marker:04x}"),
        ));
    };

    if byte_order != container_byte_order {
        return Err(Error::new(
            Domain::Input,
            Kind::ValueMismatch,
            "property-set byte order does not match the containing file",
        ));
    }

    let format = byte_order.read_u16(&buf[2..4]);
    let system_version = byte_order.read_u32(&buf[4..8]);
    let class_id = format_class_id_bytes(&buf[8..24], byte_order);
    let number_of_sections = byte_order.read_u32(&buf[24..28]);

    Ok(PropertySetHeader {
        byte_order,
        format,
        system_version,
        class_id,
        number_of_sections,
    })
}
