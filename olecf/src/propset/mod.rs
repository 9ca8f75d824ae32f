//! MS-OLEPS property-set decoder, spec.md §4.8: fully new relative to the
//! teacher, grounded in `libolecf_property_set.c`, `libolecf_property_section.c`
//! and `libolecf_property_value.c` from the original C library. Operates
//! purely over an already-read stream buffer -- any item's content may be
//! handed to [`decode`], the caller decides whether that makes sense.

pub mod header;
pub mod section;
pub mod value;

use crate::endian::ByteOrder;
use crate::Result;

pub use value::{PropertyValue, VariantType};

#[derive(Debug, Clone)]
pub struct Property {
    pub id: u32,
    pub value: PropertyValue,
}

#[derive(Debug, Clone)]
pub struct Section {
    pub class_id: Option<String>,
    pub properties: Vec<Property>,
}

impl Section {
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    pub fn property(&self, index: usize) -> Option<&Property> {
        self.properties.get(index)
    }

    pub fn property_by_id(&self, id: u32) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == id)
    }
}

#[derive(Debug, Clone)]
pub struct PropertySet {
    pub class_id: Option<String>,
    pub sections: Vec<Section>,
}

impl PropertySet {
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }
}

/// Decodes a full property set out of an already-read stream buffer,
/// spec.md §4.8. `lenient` gates the clipboard-size sentinel clamp, and
/// defaults to on via [`crate::file::OpenOptions`].
pub fn decode(stream: &[u8], container_byte_order: ByteOrder, lenient: bool) -> Result<PropertySet> {
    let head = header::parse_header(stream, container_byte_order)?;
    let list = section::parse_section_list(stream, header::PROPERTY_SET_HEADER_LEN, head.number_of_sections, head.byte_order)?;

    let mut sections = Vec::with_capacity(list.len());
    for entry in list {
        let section_offset = entry.offset as usize;
        let section_header = section::parse_section_header(stream, section_offset, head.byte_order)?;
        let prop_list_offset = section_offset + section::SECTION_HEADER_LEN;
        let prop_list = section::parse_property_list(
            stream,
            prop_list_offset,
            section_header.number_of_properties,
            head.byte_order,
        )?;

        let mut properties = Vec::with_capacity(prop_list.len());
        for entry in prop_list {
            let value_offset = section_offset + entry.payload_offset as usize;
            let value = value::read_property_value(stream, value_offset, head.byte_order, lenient)?;
            properties.push(Property {
                id: entry.property_id,
                value,
            });
        }

        sections.push(Section {
            class_id: entry.class_id,
            properties,
        });
    }

    Ok(PropertySet {
        class_id: head.class_id,
        sections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_u16(buf: &mut Vec<u8>, v: u16) {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    fn push_u32(buf: &mut Vec<u8>, v: u32) {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Builds a single-section property set with one UI4 property holding
    /// `value`, and decodes it back.
    #[test]
    fn decodes_single_ui4_property() {
        let mut stream = Vec::new();
        push_u16(&mut stream, 0xFFFE); // byte order marker
        push_u16(&mut stream, 0); // format
        push_u32(&mut stream, 0); // system version
        stream.extend_from_slice(&[0u8; 16]); // class id, none
        push_u32(&mut stream, 1); // number of sections

        // section list entry: class id + offset
        stream.extend_from_slice(&[0u8; 16]);
        let section_offset = stream.len() as u32 + 4;
        push_u32(&mut stream, section_offset);

        let section_start = stream.len();
        assert_eq!(section_start as u32, section_offset);

        push_u32(&mut stream, 0); // data_size, unused by the decoder
        push_u32(&mut stream, 1); // number_of_properties

        push_u32(&mut stream, 2); // property id
        push_u32(&mut stream, 16); // payload offset, relative to section start

        // pad to the payload offset
        while stream.len() < section_start + 16 {
            stream.push(0);
        }
        push_u32(&mut stream, 0x13); // UI4 type tag
        push_u32(&mut stream, 42); // value

        let set = decode(&stream, ByteOrder::Little, true).unwrap();
        assert_eq!(set.section_count(), 1);
        let section = set.section(0).unwrap();
        assert_eq!(section.property_count(), 1);
        let prop = section.property(0).unwrap();
        assert_eq!(prop.id, 2);
        assert_eq!(prop.value.as_u32(), Some(42));
    }
}
