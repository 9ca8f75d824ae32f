//! Synthetic OLECF byte-buffer builder used only by this crate's own tests.
//! Spec.md §9/DESIGN.md: the teacher ships a `data/` fixture corpus this
//! crate does not carry over, so tests build minimal, valid v3 (512-byte
//! sector) compound files in memory instead.
#![cfg(test)]

use crate::constants::*;

const SECTOR_SIZE: usize = 512;
const SHORT_SECTOR_SIZE: usize = 64;

struct StreamSpec {
    name: String,
    data: Vec<u8>,
}

/// Builds a minimal, valid version-3 OLECF byte buffer: one root storage
/// plus a flat list of stream/storage children (no nested storages), with
/// streams routed to the mini-stream or ordinary sectors exactly as a real
/// writer would, based on the 4096-byte threshold.
pub struct MinimalFileBuilder {
    streams: Vec<StreamSpec>,
    storages: Vec<String>,
}

impl MinimalFileBuilder {
    pub fn new() -> Self {
        MinimalFileBuilder {
            streams: Vec::new(),
            storages: Vec::new(),
        }
    }

    pub fn with_stream(mut self, name: &str, data: Vec<u8>) -> Self {
        self.streams.push(StreamSpec {
            name: name.to_string(),
            data,
        });
        self
    }

    pub fn with_storage(mut self, name: &str) -> Self {
        self.storages.push(name.to_string());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        // --- 1. lay out mini-stream (short-sector) content -------------
        let mut mini_bytes: Vec<u8> = Vec::new();
        let mut ssat_entries: Vec<u32> = Vec::new();
        let mut mini_starts: Vec<Option<u32>> = Vec::new();
        let mut mini_sizes: Vec<u64> = Vec::new();

        for s in &self.streams {
            if (s.data.len() as u32) < standard_stream_min_size() {
                let first_short = (mini_bytes.len() / SHORT_SECTOR_SIZE) as u32;
                let num_short = div_ceil(s.data.len(), SHORT_SECTOR_SIZE).max(1);
                mini_bytes.extend_from_slice(&s.data);
                let padded = num_short * SHORT_SECTOR_SIZE;
                mini_bytes.resize(mini_bytes.len() + (padded - s.data.len()), 0);
                for i in 0..num_short {
                    let idx = first_short + i;
                    let next = if i + 1 == num_short {
                        SID_END_OF_CHAIN
                    } else {
                        first_short + i + 1
                    };
                    if idx as usize >= ssat_entries.len() {
                        ssat_entries.resize(idx as usize + 1, SID_FREE);
                    }
                    ssat_entries[idx as usize] = next;
                }
                mini_starts.push(Some(first_short));
                mini_sizes.push(s.data.len() as u64);
            } else {
                mini_starts.push(None);
                mini_sizes.push(s.data.len() as u64);
            }
        }

        // --- 2. sector allocator ----------------------------------------
        let mut sectors: Vec<Vec<u8>> = Vec::new();
        let mut sat: Vec<u32> = Vec::new();

        let push_chain = |sectors: &mut Vec<Vec<u8>>, sat: &mut Vec<u32>, data: &[u8]| -> u32 {
            let first = sectors.len() as u32;
            let num = div_ceil(data.len(), SECTOR_SIZE).max(1);
            for i in 0..num {
                let start = i * SECTOR_SIZE;
                let end = ((i + 1) * SECTOR_SIZE).min(data.len());
                let mut sector = vec![0u8; SECTOR_SIZE];
                if start < data.len() {
                    sector[..end - start].copy_from_slice(&data[start..end]);
                }
                sectors.push(sector);
                let idx = first + i as u32;
                let next = if i + 1 == num {
                    SID_END_OF_CHAIN
                } else {
                    idx + 1
                };
                sat.push(next);
                let _ = idx;
            }
            first
        };

        // mini-stream lives inside the root storage's own data, in ordinary
        // sectors.
        let root_start = if !mini_bytes.is_empty() {
            Some(push_chain(&mut sectors, &mut sat, &mini_bytes))
        } else {
            None
        };
        let root_size = mini_bytes.len() as u64;

        // SSAT sectors, one u32 per short sector.
        let (ssat_first, ssat_sector_count) = if !ssat_entries.is_empty() {
            let mut buf = Vec::with_capacity(ssat_entries.len() * 4);
            for e in &ssat_entries {
                buf.extend_from_slice(&e.to_le_bytes());
            }
            let before = sectors.len();
            let first = push_chain(&mut sectors, &mut sat, &buf);
            (Some(first), sectors.len() - before)
        } else {
            (None, 0)
        };

        // regular-sector streams
        let mut regular_starts: Vec<Option<u32>> = Vec::new();
        for s in &self.streams {
            if (s.data.len() as u32) >= standard_stream_min_size() {
                let first = push_chain(&mut sectors, &mut sat, &s.data);
                regular_starts.push(Some(first));
            } else {
                regular_starts.push(None);
            }
        }

        // --- 3. directory entries ---------------------------------------
        // index 0: root. 1..N: streams then storages, linked as a simple
        // right-sibling chain hanging off root.sub (an unbalanced but valid
        // "RB tree" per spec.md §3's explicit tolerance for this).
        let total_children = self.streams.len() + self.storages.len();
        let mut entries: Vec<Vec<u8>> = Vec::new();

        let root_sub = if total_children > 0 { 1u32 } else { NO_STREAM };
        entries.push(encode_entry(
            "Root Entry",
            OBJECT_TYPE_ROOT_STORAGE,
            NO_STREAM,
            NO_STREAM,
            root_sub,
            root_start.map(|s| s).unwrap_or(SID_FREE),
            root_size,
        ));

        for (i, s) in self.streams.iter().enumerate() {
            let id = 1 + i as u32;
            let next = if (i + 1) < total_children {
                id + 1
            } else {
                NO_STREAM
            };
            let start = mini_starts[i].or(regular_starts[i]).unwrap_or(SID_FREE);
            entries.push(encode_entry(
                &s.name,
                OBJECT_TYPE_STREAM,
                NO_STREAM,
                next,
                NO_STREAM,
                start,
                mini_sizes[i],
            ));
        }
        for (i, name) in self.storages.iter().enumerate() {
            let id = 1 + self.streams.len() as u32 + i as u32;
            let next = if (id as usize) < total_children {
                id + 1
            } else {
                NO_STREAM
            };
            entries.push(encode_entry(
                name,
                OBJECT_TYPE_STORAGE,
                NO_STREAM,
                next,
                NO_STREAM,
                SID_FREE,
                0,
            ));
        }

        let mut dir_bytes = Vec::with_capacity(entries.len() * SIZE_OF_DIRECTORY_ENTRY);
        for e in &entries {
            dir_bytes.extend_from_slice(e);
        }
        let dir_first = push_chain(&mut sectors, &mut sat, &dir_bytes);

        // --- 4. SAT sector(s) --------------------------------------------
        // pad SAT to a whole number of sectors worth of u32 entries, for
        // every sector including the SAT sector(s) themselves.
        let sat_sector_index = sectors.len() as u32;
        sat.push(SID_SAT_SECTOR);
        sectors.push(vec![0u8; SECTOR_SIZE]); // placeholder, filled below

        let entries_per_sector = SECTOR_SIZE / 4;
        let needed_sat_sectors = div_ceil(sat.len(), entries_per_sector).max(1);
        assert_eq!(
            needed_sat_sectors, 1,
            "test fixture grew past a single SAT sector; extend MinimalFileBuilder"
        );
        sat.resize(entries_per_sector, SID_FREE);
        let mut sat_buf = Vec::with_capacity(SECTOR_SIZE);
        for e in &sat {
            sat_buf.extend_from_slice(&e.to_le_bytes());
        }
        sectors[sat_sector_index as usize] = sat_buf;

        // --- 5. header ----------------------------------------------------
        let mut header = vec![0u8; SECTOR_SIZE];
        header[0x00..0x08].copy_from_slice(&MAGIC_BYTES);
        header[0x18..0x1A].copy_from_slice(&0x3Eu16.to_le_bytes()); // minor
        header[0x1A..0x1C].copy_from_slice(&3u16.to_le_bytes()); // major
        header[0x1C..0x1E].copy_from_slice(&BYTE_ORDER_LITTLE.to_le_bytes());
        header[0x1E..0x20].copy_from_slice(&9u16.to_le_bytes()); // sector shift (512)
        header[0x20..0x22].copy_from_slice(&6u16.to_le_bytes()); // short sector shift (64)
        header[0x2C..0x30].copy_from_slice(&1u32.to_le_bytes()); // number of SAT sectors
        header[0x30..0x34].copy_from_slice(&dir_first.to_le_bytes());
        header[0x38..0x3C].copy_from_slice(&standard_stream_min_size().to_le_bytes());
        header[0x3C..0x40].copy_from_slice(
            &ssat_first.unwrap_or(SID_END_OF_CHAIN).to_le_bytes(),
        );
        header[0x40..0x44].copy_from_slice(&(ssat_sector_count as u32).to_le_bytes());
        header[0x44..0x48].copy_from_slice(&SID_END_OF_CHAIN.to_le_bytes()); // no MSAT overflow
        header[0x48..0x4C].copy_from_slice(&0u32.to_le_bytes());

        let mut msat_head = vec![SID_FREE; SIZE_OF_MSAT_HEAD_ENTRIES];
        msat_head[0] = sat_sector_index;
        for (i, e) in msat_head.iter().enumerate() {
            let off = 0x4C + i * 4;
            header[off..off + 4].copy_from_slice(&e.to_le_bytes());
        }

        let mut out = header;
        for s in sectors {
            out.extend_from_slice(&s);
        }
        out
    }
}

fn standard_stream_min_size() -> u32 {
    4096
}

fn div_ceil(n: usize, d: usize) -> usize {
    (n + d - 1) / d
}

#[allow(clippy::too_many_arguments)]
fn encode_entry(
    name: &str,
    object_type: u8,
    left_sibling: u32,
    right_sibling: u32,
    child: u32,
    start_sector: u32,
    size: u64,
) -> Vec<u8> {
    let mut buf = vec![0u8; SIZE_OF_DIRECTORY_ENTRY];
    let utf16: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
    let name_bytes_len = (utf16.len() * 2).min(64);
    for (i, unit) in utf16.iter().enumerate() {
        if i * 2 + 2 > 64 {
            break;
        }
        buf[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
    }
    buf[0x40..0x42].copy_from_slice(&(name_bytes_len as u16).to_le_bytes());
    buf[0x42] = object_type;
    buf[0x43] = 0x01; // color: black, discarded on read per spec.md §3
    buf[0x44..0x48].copy_from_slice(&left_sibling.to_le_bytes());
    buf[0x48..0x4C].copy_from_slice(&right_sibling.to_le_bytes());
    buf[0x4C..0x50].copy_from_slice(&child.to_le_bytes());
    // class id, user flags, creation/modification FILETIME left zeroed.
    buf[0x74..0x78].copy_from_slice(&start_sector.to_le_bytes());
    buf[0x78..0x7C].copy_from_slice(&(size as u32).to_le_bytes());
    buf
}
