//! End-to-end tests exercising the public API against synthetic OLECF
//! byte buffers, covering spec.md §8's scenarios: a minimal v3 file, a
//! SummaryInformation probe, mini-stream and ordinary-sector reads, cycle
//! tolerance, and header-signature rejection.

use olecf::{Domain, Kind, OleFile, OpenOptions};

mod support;
use support::MinimalFileBuilder;

#[test]
fn opens_a_minimal_v3_file_and_walks_its_tree() {
    let bytes = MinimalFileBuilder::new()
        .with_stream("Stream1", vec![1u8; 100])
        .with_storage("Storage1")
        .build();
    let file = OleFile::open_bytes(bytes).unwrap();

    assert_eq!(file.format_version(), (3, 0x3E));
    assert_eq!(file.sector_size(), 512);
    assert_eq!(file.short_sector_size(), 64);

    let root = file.root().unwrap();
    assert!(root.is_root());
    assert_eq!(root.child_count(), 2);

    let stream = root.child_by_name("stream1").expect("lookup is case-insensitive");
    assert!(stream.is_stream());
    assert_eq!(stream.size(), 100);

    let storage = root.child_by_name("Storage1").unwrap();
    assert!(storage.is_storage());
    assert_eq!(storage.child_count(), 0);
}

#[test]
fn reads_a_mini_stream_backed_item_fully() {
    let payload: Vec<u8> = (0u8..64).collect();
    let bytes = MinimalFileBuilder::new()
        .with_stream("Tiny", payload.clone())
        .build();
    let file = OleFile::open_bytes(bytes).unwrap();

    let item = file.item_by_path("Tiny").unwrap();
    let mut out = vec![0u8; payload.len()];
    assert_eq!(item.read(&mut out).unwrap(), payload.len());
    assert_eq!(out, payload);
    // cursor has advanced to EOF; a further read returns 0, not an error.
    assert_eq!(item.read(&mut out).unwrap(), 0);
}

#[test]
fn reads_an_ordinary_sector_backed_item_across_several_sectors() {
    let mut payload = vec![0u8; 3 * 512 + 17];
    for (i, b) in payload.iter_mut().enumerate() {
        *b = (i % 256) as u8;
    }
    let bytes = MinimalFileBuilder::new()
        .with_stream("Large", payload.clone())
        .build();
    let file = OleFile::open_bytes(bytes).unwrap();

    let item = file.item_by_path("Large").unwrap();
    assert_eq!(item.size(), payload.len() as u64);

    // read in two chunks to exercise cursor advancement across the call.
    let mut first_half = vec![0u8; payload.len() / 2];
    let mut second_half = vec![0u8; payload.len() - first_half.len()];
    let n1 = item.read(&mut first_half).unwrap();
    let n2 = item.read(&mut second_half).unwrap();
    assert_eq!(n1, first_half.len());
    assert_eq!(n2, second_half.len());
    let mut reassembled = first_half;
    reassembled.extend_from_slice(&second_half);
    assert_eq!(reassembled, payload);
}

#[test]
fn decodes_summary_information_when_present() {
    let mut prop_stream = Vec::new();
    prop_stream.extend_from_slice(&0xFFFEu16.to_le_bytes()); // byte order marker
    prop_stream.extend_from_slice(&0u16.to_le_bytes()); // format
    prop_stream.extend_from_slice(&0u32.to_le_bytes()); // system version
    prop_stream.extend_from_slice(&[0u8; 16]); // class id
    prop_stream.extend_from_slice(&1u32.to_le_bytes()); // one section

    prop_stream.extend_from_slice(&[0u8; 16]); // section list: class id
    let section_offset = prop_stream.len() as u32 + 4;
    prop_stream.extend_from_slice(&section_offset.to_le_bytes());

    let section_start = prop_stream.len();
    prop_stream.extend_from_slice(&0u32.to_le_bytes()); // data size, unused
    prop_stream.extend_from_slice(&1u32.to_le_bytes()); // one property

    prop_stream.extend_from_slice(&2u32.to_le_bytes()); // PIDSI_TITLE
    prop_stream.extend_from_slice(&16u32.to_le_bytes()); // payload offset

    while prop_stream.len() < section_start + 16 {
        prop_stream.push(0);
    }
    prop_stream.extend_from_slice(&0x13u32.to_le_bytes()); // VT_UI4
    prop_stream.extend_from_slice(&7u32.to_le_bytes());

    let bytes = MinimalFileBuilder::new()
        .with_stream("\u{5}SummaryInformation", prop_stream)
        .build();
    let file = OleFile::open_bytes(bytes).unwrap();

    let item = file.summary_information().expect("stream is present");
    let set = item.as_property_set().unwrap();
    assert_eq!(set.section_count(), 1);
    let section = set.section(0).unwrap();
    let prop = section.property_by_id(2).unwrap();
    assert_eq!(prop.value.as_u32(), Some(7));
}

#[test]
fn missing_summary_information_is_none_not_an_error() {
    let bytes = MinimalFileBuilder::new().with_stream("Other", vec![1u8; 8]).build();
    let file = OleFile::open_bytes(bytes).unwrap();
    assert!(file.summary_information().is_none());
    assert!(file.document_summary_information().is_none());
}

#[test]
fn rejects_a_file_with_the_wrong_signature() {
    let mut bytes = MinimalFileBuilder::new().with_stream("X", vec![0u8; 8]).build();
    bytes[0] = 0x00;
    let err = OleFile::open_bytes(bytes).unwrap_err();
    assert_eq!(err.domain, Domain::Runtime);
    assert_eq!(err.kind, Kind::UnsupportedValue);
}

#[test]
fn tolerates_a_self_referential_chain_instead_of_hanging() {
    // A single 5000-byte stream lands in ordinary sectors 0..9 (10 sectors
    // of 512 bytes), the directory in sector 10, the SAT itself in sector
    // 11 -- see MinimalFileBuilder::build. Corrupting the SAT's first
    // entry (the stream's own first-sector pointer) into a self-loop
    // reproduces a corrupted chain; the read must terminate with the data
    // collected so far instead of hanging or panicking, per spec.md §9.
    let payload = vec![9u8; 5000];
    let mut bytes = MinimalFileBuilder::new().with_stream("Looping", payload).build();

    let sat_sector_offset = 512 + 11 * 512;
    bytes[sat_sector_offset..sat_sector_offset + 4].copy_from_slice(&0u32.to_le_bytes());

    let file = OleFile::open_bytes(bytes).unwrap();
    let item = file.item_by_path("Looping").unwrap();
    assert_eq!(item.size(), 5000);

    let mut out = vec![0u8; 5000];
    let n = item.read(&mut out).unwrap();
    // only the single (self-looping) sector's worth of data comes back.
    assert_eq!(n, 512);
    assert!(out[..512].iter().all(|&b| b == 9));
}

#[test]
fn abort_handle_set_before_open_stops_the_open_call() {
    let bytes = MinimalFileBuilder::new().with_stream("X", vec![0u8; 8]).build();
    let abort = olecf::AbortHandle::new();
    abort.request();
    let err = OpenOptions::new().abort_handle(abort).open_bytes(bytes).unwrap_err();
    assert_eq!(err.kind, Kind::AbortRequested);
}
