//! Fixed byte layouts, magic numbers and sentinel values from the OLE
//! Compound File Binary Format (MS-CFB) and MS-OLEPS specifications.

pub const HEADER_LEN: usize = 512;

pub const MAGIC_BYTES: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
/// Rare big-endian ("beta") signature variant, see spec.md §3/§4.2.
pub const MAGIC_BYTES_BETA: [u8; 8] = [0x0E, 0x11, 0xFC, 0x0D, 0xD0, 0xCF, 0x11, 0x0E];

pub const BYTE_ORDER_LITTLE: u16 = 0xFFFE;
pub const BYTE_ORDER_BIG: u16 = 0xFEFF;

pub const MAJOR_VERSION_3: u16 = 3;
pub const MAJOR_VERSION_4: u16 = 4;

pub const SIZE_OF_DIRECTORY_ENTRY: usize = 128;
pub const SIZE_OF_MSAT_HEAD_ENTRIES: usize = 109;

/// Sector identifiers, spec.md §3.
pub const SID_FREE: u32 = 0xFFFF_FFFF;
pub const SID_END_OF_CHAIN: u32 = 0xFFFF_FFFE;
pub const SID_SAT_SECTOR: u32 = 0xFFFF_FFFD;
pub const SID_MSAT_SECTOR: u32 = 0xFFFF_FFFC;

/// Largest directory identifier that is a "regular" stream id (MAXREGSID);
/// anything above it other than the sentinels is invalid.
pub const MAX_REGULAR_DIRECTORY_ID: u32 = 0xFFFF_FFFA;
/// Sentinel directory identifier meaning "no such link" (NOSTREAM).
pub const NO_STREAM: u32 = 0xFFFF_FFFF;

/// Directory entry object type tags, spec.md §3.
pub const OBJECT_TYPE_EMPTY: u8 = 0x00;
pub const OBJECT_TYPE_STORAGE: u8 = 0x01;
pub const OBJECT_TYPE_STREAM: u8 = 0x02;
pub const OBJECT_TYPE_ROOT_STORAGE: u8 = 0x05;

/// Guard against pathological MSAT/SSAT chains, spec.md §4.3/§4.5.
pub const MAX_CHAIN_DEPTH: usize = 4096;

pub const SUMMARY_INFORMATION_NAME: &str = "\u{5}SummaryInformation";
pub const DOCUMENT_SUMMARY_INFORMATION_NAME: &str = "\u{5}DocumentSummaryInformation";

/// `{F29F85E0-4FF9-1068-AB91-08002B27B3D9}`, the well-known class id of the
/// standard "SummaryInformation" property set.
pub const SUMMARY_INFORMATION_CLASS_ID: &str = "F29F85E0-4FF9-1068-AB91-08002B27B3D9";
