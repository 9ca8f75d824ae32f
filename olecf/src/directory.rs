//! L4: directory entries and the storage/stream tree they describe,
//! spec.md §4.6.
//!
//! On disk, each storage's children are a red-black tree threaded through
//! `left_sibling`/`right_sibling`, rooted at that storage's `child` slot.
//! This reader does not reproduce the red-black tree: it flattens each
//! subtree into an ordered `Vec` in a single in-order walk and discards the
//! color bit, which is irrelevant once the tree is no longer being mutated,
//! per spec.md's Design Notes on the directory tree. The result is held in
//! a flat arena (`Vec<TreeNode>` addressed by `NodeId`) rather than the
//! teacher's raw recursive `Vec<DirectoryEntry>` walk, so that repeated or
//! cyclic sibling/child links can be caught once during assembly instead of
//! on every subsequent traversal.

use std::collections::HashSet;

use derivative::Derivative;

use crate::constants::*;
use crate::endian::ByteOrder;
use crate::error::{Error, Kind};
use crate::Result;

pub type NodeId = usize;

/// One parsed 128-byte directory entry, spec.md §4.6.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct DirectoryEntry {
    pub name: String,
    pub object_type: u8,
    pub left_sibling: u32,
    pub right_sibling: u32,
    pub child: u32,
    pub class_id: Option<String>,
    // rarely meaningful outside the original authoring application.
    #[derivative(Debug = "ignore")]
    pub user_flags: u32,
    pub creation_time: Option<chrono::NaiveDateTime>,
    pub modification_time: Option<chrono::NaiveDateTime>,
    pub starting_sector: u32,
    pub size: u64,
}

impl DirectoryEntry {
    pub fn is_storage(&self) -> bool {
        matches!(self.object_type, OBJECT_TYPE_STORAGE | OBJECT_TYPE_ROOT_STORAGE)
    }

    pub fn is_stream(&self) -> bool {
        self.object_type == OBJECT_TYPE_STREAM
    }

    pub fn is_root(&self) -> bool {
        self.object_type == OBJECT_TYPE_ROOT_STORAGE
    }
}

/// A node in the flattened directory tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub entry: DirectoryEntry,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// The assembled directory tree for one open file. `root` is `None` only
/// when the directory stream contains no `ROOT_STORAGE` entry at all,
/// spec.md §8: "empty directory tree ... get_root_item returns 'no such
/// item', not error".
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    root: Option<NodeId>,
}

impl Tree {
    pub fn root_id(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn find_child_by_name(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].entry.name.eq_ignore_ascii_case(name))
    }

    /// Resolves a `/`-separated path starting at `from`, spec.md §6 ("child
    /// by path", relative to the item it's called on).
    pub fn resolve_path_from(&self, from: NodeId, path: &str) -> Option<NodeId> {
        let mut current = from;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current = self.find_child_by_name(current, part)?;
        }
        Some(current)
    }

    /// Finds the first child of the root storage whose name equals `name`,
    /// used for the SummaryInformation / DocumentSummaryInformation
    /// quick-lookups, spec.md §4.8.
    pub fn find_root_child_by_exact_name(&self, name: &str) -> Option<NodeId> {
        let root = self.root?;
        self.nodes[root]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].entry.name == name)
    }
}

/// Parses the raw directory stream (a run of 128-byte records) into
/// [`DirectoryEntry`] values, spec.md §4.6.
pub fn parse_directory_entries(
    raw: &[u8],
    byte_order: ByteOrder,
    major_version: u16,
) -> Result<Vec<DirectoryEntry>> {
    if raw.len() % SIZE_OF_DIRECTORY_ENTRY != 0 {
        log::warn!(
            "directory stream length {} is not a multiple of the entry size, truncating",
            raw.len()
        );
    }

    let mut entries = Vec::with_capacity(raw.len() / SIZE_OF_DIRECTORY_ENTRY);
    for chunk in raw.chunks_exact(SIZE_OF_DIRECTORY_ENTRY) {
        entries.push(parse_one_entry(chunk, byte_order, major_version)?);
    }
    Ok(entries)
}

fn parse_one_entry(buf: &[u8], byte_order: ByteOrder, major_version: u16) -> Result<DirectoryEntry> {
    let name_len_bytes = byte_order.read_u16(&buf[0x40..0x42]) as usize;
    let name_len_bytes = name_len_bytes.min(64);
    let name = if name_len_bytes >= 2 {
        let units: Vec<u16> = buf[0..name_len_bytes - 2]
            .chunks_exact(2)
            .map(|c| byte_order.read_u16(c))
            .collect();
        String::from_utf16(&units).unwrap_or_else(|_| {
            log::warn!("directory entry name is not valid UTF-16, substituting lossy decode");
            String::from_utf16_lossy(&units)
        })
    } else {
        String::new()
    };

    let object_type = buf[0x42];
    let left_sibling = sanitize_id(byte_order.read_u32(&buf[0x44..0x48]));
    let right_sibling = sanitize_id(byte_order.read_u32(&buf[0x48..0x4C]));
    let child = sanitize_id(byte_order.read_u32(&buf[0x4C..0x50]));
    let class_id = format_class_id_bytes(&buf[0x50..0x60], byte_order);
    let user_flags = byte_order.read_u32(&buf[0x60..0x64]);
    let creation_time = filetime_to_datetime(byte_order.read_u64(&buf[0x64..0x6C]));
    let modification_time = filetime_to_datetime(byte_order.read_u64(&buf[0x6C..0x74]));
    let starting_sector = byte_order.read_u32(&buf[0x74..0x78]);

    let size_low = byte_order.read_u32(&buf[0x78..0x7C]) as u64;
    let size_high = byte_order.read_u32(&buf[0x7C..0x80]) as u64;
    let size = if major_version == MAJOR_VERSION_3 {
        if size_high != 0 {
            log::warn!("version 3 directory entry has a non-zero high size dword, ignoring it");
        }
        size_low
    } else {
        (size_high << 32) | size_low
    };

    Ok(DirectoryEntry {
        name,
        object_type,
        left_sibling,
        right_sibling,
        child,
        class_id,
        user_flags,
        creation_time,
        modification_time,
        starting_sector,
        size,
    })
}

/// Tolerates an out-of-range sibling/child identifier (anything above
/// `MAX_REGULAR_DIRECTORY_ID` other than `NO_STREAM`) by treating it as
/// absent, logging rather than failing the open.
fn sanitize_id(id: u32) -> u32 {
    if id == NO_STREAM || id <= MAX_REGULAR_DIRECTORY_ID {
        id
    } else {
        log::warn!("directory entry references out-of-range id {id}, treating as absent");
        NO_STREAM
    }
}

pub(crate) fn format_class_id_bytes(bytes: &[u8], byte_order: ByteOrder) -> Option<String> {
    if bytes.iter().all(|&b| b == 0) {
        return None;
    }
    let d1 = byte_order.read_u32(&bytes[0..4]);
    let d2 = byte_order.read_u16(&bytes[4..6]);
    let d3 = byte_order.read_u16(&bytes[6..8]);
    let d4 = &bytes[8..16];
    Some(format!(
        "{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
        d1, d2, d3, d4[0], d4[1], d4[2], d4[3], d4[4], d4[5], d4[6], d4[7]
    ))
}

fn filetime_to_datetime(ticks: u64) -> Option<chrono::NaiveDateTime> {
    if ticks == 0 {
        return None;
    }
    epochs::windows_file(ticks as i64)
}

/// Assembles the flattened [`Tree`] from the parsed entry list, spec.md
/// §4.6 step 1: the first `ROOT_STORAGE`-typed entry in the list becomes
/// the tree's root; every other entry is reached exactly once by walking
/// `child` subtrees in order. Per spec.md §9's preserved quirk, a root
/// storage that isn't at index 0 is tolerated (logged), not rejected --
/// only its *absence* is an error ("no such item" territory, handled by the
/// caller via an empty tree, not a hard failure here).
pub fn build_tree(entries: Vec<DirectoryEntry>) -> Result<Tree> {
    if entries.is_empty() {
        return Err(Error::input(
            Kind::ValueMissing,
            "directory stream contains no entries",
        ));
    }
    // spec.md §8: a directory stream with no ROOT_STORAGE entry at all is
    // a valid (if degenerate) container with no root item, not an error.
    let Some((root_index, root_entry)) = entries
        .iter()
        .enumerate()
        .find(|(_, e)| e.is_root())
        .map(|(i, e)| (i, e.clone()))
    else {
        log::warn!("directory stream has no ROOT_STORAGE entry");
        return Ok(Tree {
            nodes: Vec::new(),
            root: None,
        });
    };
    // spec.md §9 preserved quirk: root storage not first in the list is
    // warned about, not rejected.
    if root_index != 0 {
        log::warn!(
            "root storage entry is at directory position {root_index}, not 0, continuing anyway"
        );
    }

    let mut arena = vec![TreeNode {
        entry: root_entry.clone(),
        parent: None,
        children: Vec::new(),
    }];

    // Tree-wide `set_in_tree` flag, spec.md §3/§4.6/§8: every non-empty
    // entry is reachable exactly once from the root; a revisit from any
    // storage/sibling chain anywhere in the tree is a structural error, not
    // a per-subtree cycle to silently truncate. The root entry itself
    // occupies `root_index` and must never be re-entered either.
    let mut set_in_tree = HashSet::new();
    set_in_tree.insert(root_index as u32);

    if root_entry.child != NO_STREAM {
        let mut children = Vec::new();
        flatten_subtree(&entries, root_entry.child, 0, &mut arena, &mut children, &mut set_in_tree)?;
        arena[0].children = children;
    }

    Ok(Tree {
        nodes: arena,
        root: Some(0),
    })
}

/// In-order walk (left, self, right) of the red-black subtree rooted at
/// `node_id`, appending flattened nodes as children of `owner` and
/// recursing into each node's own `child` subtree as that node's children.
///
/// `set_in_tree` is shared across the *entire* descent (every storage's
/// sibling chain and every nested `child` subtree), per spec.md §4.6 step 5:
/// marking an entry that is already marked is a structural error
/// (`ValueAlreadySet`), not a cycle to tolerate.
fn flatten_subtree(
    entries: &[DirectoryEntry],
    node_id: u32,
    owner: NodeId,
    arena: &mut Vec<TreeNode>,
    out_children: &mut Vec<NodeId>,
    set_in_tree: &mut HashSet<u32>,
) -> Result<()> {
    if node_id == NO_STREAM {
        return Ok(());
    }
    if node_id as usize >= entries.len() {
        log::warn!("directory tree references entry {node_id} beyond the directory stream, skipping");
        return Ok(());
    }
    if !set_in_tree.insert(node_id) {
        return Err(Error::runtime(
            Kind::ValueAlreadySet,
            format!("directory entry {node_id} is reachable from more than one place in the tree"),
        ));
    }

    let entry = entries[node_id as usize].clone();

    flatten_subtree(entries, entry.left_sibling, owner, arena, out_children, set_in_tree)?;

    let new_id = arena.len();
    arena.push(TreeNode {
        entry: entry.clone(),
        parent: Some(owner),
        children: Vec::new(),
    });
    out_children.push(new_id);

    if entry.child != NO_STREAM {
        let mut grandchildren = Vec::new();
        flatten_subtree(entries, entry.child, new_id, arena, &mut grandchildren, set_in_tree)?;
        arena[new_id].children = grandchildren;
    }

    flatten_subtree(entries, entry.right_sibling, owner, arena, out_children, set_in_tree)?;

    Ok(())
}
