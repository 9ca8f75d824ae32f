//! VARIANT type dispatch and property-value storage, spec.md §4.8/§6.

use crate::endian::ByteOrder;
use crate::error::{Error, Kind};
use crate::propset::section::slice_or_err;
use crate::Result;

const VT_VECTOR_FLAG: u32 = 0x1000;

/// One recognised OLE VARIANT type tag, spec §6's table, with an `Other`
/// catch-all for anything else -- unknown tags are tolerated, not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantType {
    Empty,
    Null,
    I2,
    I4,
    R4,
    R8,
    Currency,
    ApplicationTime,
    Boolean,
    I1,
    Ui1,
    Ui2,
    Ui4,
    I8,
    Ui8,
    Int,
    Uint,
    StringAscii,
    StringUnicode,
    FileTime,
    BinaryData,
    ClipboardFormat,
    Guid,
    Other(u32),
}

impl VariantType {
    pub fn from_tag(tag: u32) -> Self {
        match tag {
            0x00 => VariantType::Empty,
            0x01 => VariantType::Null,
            0x02 => VariantType::I2,
            0x03 => VariantType::I4,
            0x04 => VariantType::R4,
            0x05 => VariantType::R8,
            0x06 => VariantType::Currency,
            0x07 => VariantType::ApplicationTime,
            0x0B => VariantType::Boolean,
            0x10 => VariantType::I1,
            0x11 => VariantType::Ui1,
            0x12 => VariantType::Ui2,
            0x13 => VariantType::Ui4,
            0x14 => VariantType::I8,
            0x15 => VariantType::Ui8,
            0x16 => VariantType::Int,
            0x17 => VariantType::Uint,
            0x1E => VariantType::StringAscii,
            0x1F => VariantType::StringUnicode,
            0x40 => VariantType::FileTime,
            0x41 => VariantType::BinaryData,
            0x47 => VariantType::ClipboardFormat,
            0x48 => VariantType::Guid,
            other => VariantType::Other(other),
        }
    }

    /// `Some(width)` for types with a fixed, exactly-known byte width;
    /// `None` for length-prefixed ("variable-size") types and anything
    /// unrecognised, per spec.md §4.8 step 3.
    fn fixed_width(self) -> Option<usize> {
        match self {
            VariantType::Empty | VariantType::Null => Some(0),
            VariantType::I2 | VariantType::Ui2 | VariantType::Boolean => Some(2),
            VariantType::I4
            | VariantType::R4
            | VariantType::Ui4
            | VariantType::Int
            | VariantType::Uint => Some(4),
            VariantType::R8
            | VariantType::Currency
            | VariantType::ApplicationTime
            | VariantType::I8
            | VariantType::Ui8
            | VariantType::FileTime => Some(8),
            VariantType::I1 | VariantType::Ui1 => Some(1),
            VariantType::Guid => Some(16),
            _ => None,
        }
    }
}

/// A decoded property value: its type tag, and one payload per element
/// (a single element for scalars, `count` elements for vector types).
#[derive(Debug, Clone)]
pub struct PropertyValue {
    pub variant_type: VariantType,
    pub is_vector: bool,
    pub elements: Vec<Vec<u8>>,
}

impl PropertyValue {
    pub fn raw(&self) -> &[u8] {
        self.elements.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn as_bool(&self) -> Option<bool> {
        let bytes = self.raw();
        if bytes.len() < 2 {
            return None;
        }
        Some(u16::from_le_bytes([bytes[0], bytes[1]]) != 0)
    }

    pub fn as_u16(&self) -> Option<u16> {
        let bytes = self.raw();
        (bytes.len() >= 2).then(|| u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn as_u32(&self) -> Option<u32> {
        let bytes = self.raw();
        (bytes.len() >= 4).then(|| u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn as_u64(&self) -> Option<u64> {
        let bytes = self.raw();
        if bytes.len() < 8 {
            return None;
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[0..8]);
        Some(u64::from_le_bytes(buf))
    }

    pub fn as_filetime(&self) -> Option<chrono::NaiveDateTime> {
        let ticks = self.as_u64()?;
        if ticks == 0 {
            return None;
        }
        epochs::windows_file(ticks as i64)
    }

    /// Decodes an ASCII/codepage-tagged string property, trimming at the
    /// first NUL (the stored size may be padded, spec.md §4.8 step 3).
    pub fn as_string_ascii(&self, encoding: &'static encoding_rs::Encoding) -> Option<String> {
        let bytes = trim_at_nul(self.raw());
        let (decoded, _, had_errors) = encoding.decode(bytes);
        if had_errors {
            log::warn!("property value string contained characters not valid in the configured codepage");
        }
        Some(decoded.into_owned())
    }

    pub fn as_string_unicode(&self) -> Option<String> {
        let bytes = self.raw();
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        let units = trim_u16_at_nul(&units);
        Some(String::from_utf16_lossy(units))
    }
}

fn trim_at_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(i) => &bytes[..i],
        None => bytes,
    }
}

fn trim_u16_at_nul(units: &[u16]) -> &[u16] {
    match units.iter().position(|&u| u == 0) {
        Some(i) => &units[..i],
        None => units,
    }
}

/// Reads one property value at `offset` within `stream`, spec.md §4.8
/// steps 2-5.
pub fn read_property_value(
    stream: &[u8],
    offset: usize,
    byte_order: ByteOrder,
    lenient: bool,
) -> Result<PropertyValue> {
    let tag_bytes = slice_or_err(stream, offset, offset + 4, "property value type tag")?;
    let tag = byte_order.read_u32(tag_bytes);
    let is_vector = tag & VT_VECTOR_FLAG != 0;
    let base_tag = tag & !VT_VECTOR_FLAG;
    let variant_type = VariantType::from_tag(base_tag);
    let mut cursor = offset + 4;

    let mut elements = Vec::new();
    if is_vector {
        let count_bytes = slice_or_err(stream, cursor, cursor + 4, "property value vector count")?;
        let count = byte_order.read_u32(count_bytes);
        cursor += 4;
        for _ in 0..count {
            let (bytes, consumed) = read_one_element(stream, cursor, byte_order, variant_type, lenient)?;
            elements.push(bytes);
            cursor += consumed;
        }
    } else {
        let (bytes, _) = read_one_element(stream, cursor, byte_order, variant_type, lenient)?;
        elements.push(bytes);
    }

    Ok(PropertyValue {
        variant_type,
        is_vector,
        elements,
    })
}

fn read_one_element(
    stream: &[u8],
    offset: usize,
    byte_order: ByteOrder,
    variant_type: VariantType,
    lenient: bool,
) -> Result<(Vec<u8>, usize)> {
    if let Some(width) = variant_type.fixed_width() {
        let bytes = slice_or_err(stream, offset, offset + width, "fixed-size property value")?;
        return Ok((bytes.to_vec(), width));
    }

    // Variable-size: ASCII/Unicode strings, BINARY_DATA, CLIPBOARD_FORMAT,
    // and any unrecognised type, all length-prefixed.
    let size_bytes = slice_or_err(stream, offset, offset + 4, "property value size prefix")?;
    let mut size = byte_order.read_u32(size_bytes);

    if lenient && variant_type == VariantType::ClipboardFormat && (size == 0x0FFF_FFFE || size == 0x0FFF_FFFF)
    {
        log::warn!("clamping corrupt clipboard-format size {size:#x} to 4 bytes");
        size = 4;
    }

    // Preserved quirk, spec.md §9: clipboard data above this size is
    // rejected outright rather than truncated or skipped.
    const MAX_CLIPBOARD_DATA_SIZE: u32 = 0x190;
    if variant_type == VariantType::ClipboardFormat && size > MAX_CLIPBOARD_DATA_SIZE {
        return Err(Error::new(
            crate::error::Domain::Arguments,
            Kind::UnsupportedValue,
            format!("unsupported clipboard data size: {size:#010x}"),
        ));
    }

    if size > (u32::MAX / 2) {
        return Err(Error::input(
            Kind::ValueExceedsMaximum,
            format!("property value size {size} exceeds the maximum accepted payload"),
        ));
    }

    let start = offset + 4;
    let bytes = slice_or_err(stream, start, start + size as usize, "variable-size property value")?;
    Ok((bytes.to_vec(), 4 + size as usize))
}
