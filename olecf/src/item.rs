//! L6: public item handle, spec.md §5/§6.
//!
//! An `Item` is a thin, cheaply cloned view into the tree owned by the
//! `OleFile` it came from: a node id, a shared reference to the open
//! file's inner state, and a private cursor. Per spec.md §5 ("items own
//! their own cursor"), the cursor is a `Cell<u64>` -- interior-mutable but
//! not `Sync`, so an `Item` can move between threads but not be read from
//! two threads at once without external synchronisation (the shared
//! `Arc<Mutex<Inner>>` it also holds is both `Send` and `Sync` on its own).

use std::cell::Cell;
use std::sync::{Arc, Mutex};

use crate::directory::{DirectoryEntry, NodeId};
use crate::file::Inner;
use crate::propset::PropertySet;
use crate::stream::SeekFrom;
use crate::Result;

#[derive(Clone)]
pub struct Item {
    pub(crate) file: Arc<Mutex<Inner>>,
    pub(crate) node: NodeId,
    cursor: Cell<u64>,
}

impl Item {
    pub(crate) fn new(file: Arc<Mutex<Inner>>, node: NodeId) -> Self {
        Item {
            file,
            node,
            cursor: Cell::new(0),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.file.lock().expect("olecf internal state mutex poisoned")
    }

    fn with_entry<T>(&self, f: impl FnOnce(&DirectoryEntry) -> T) -> T {
        let inner = self.lock();
        f(&inner.tree.node(self.node).entry)
    }

    pub fn name(&self) -> String {
        self.with_entry(|e| e.name.clone())
    }

    pub fn is_storage(&self) -> bool {
        self.with_entry(|e| e.is_storage())
    }

    pub fn is_stream(&self) -> bool {
        self.with_entry(|e| e.is_stream())
    }

    pub fn is_root(&self) -> bool {
        self.with_entry(|e| e.is_root())
    }

    pub fn class_id(&self) -> Option<String> {
        self.with_entry(|e| e.class_id.clone())
    }

    pub fn size(&self) -> u64 {
        self.with_entry(|e| e.size)
    }

    pub fn creation_time(&self) -> Option<chrono::NaiveDateTime> {
        self.with_entry(|e| e.creation_time)
    }

    pub fn modification_time(&self) -> Option<chrono::NaiveDateTime> {
        self.with_entry(|e| e.modification_time)
    }

    pub fn child_count(&self) -> usize {
        self.lock().tree.children(self.node).len()
    }

    pub fn children(&self) -> Vec<Item> {
        let ids: Vec<NodeId> = self.lock().tree.children(self.node).to_vec();
        ids.into_iter().map(|id| Item::new(Arc::clone(&self.file), id)).collect()
    }

    pub fn child_by_index(&self, index: usize) -> Option<Item> {
        let ids = self.lock().tree.children(self.node).to_vec();
        ids.get(index).map(|&id| Item::new(Arc::clone(&self.file), id))
    }

    pub fn child_by_name(&self, name: &str) -> Option<Item> {
        let id = self.lock().tree.find_child_by_name(self.node, name)?;
        Some(Item::new(Arc::clone(&self.file), id))
    }

    /// Resolves a `\`-separated path relative to this item, spec.md §6.
    pub fn item_by_path(&self, path: &str) -> Option<Item> {
        let slash_path = path.replace('\\', "/");
        let id = self.lock().tree.resolve_path_from(self.node, &slash_path)?;
        Some(Item::new(Arc::clone(&self.file), id))
    }

    /// Reads up to `buf.len()` bytes starting at the item's current
    /// cursor, advancing it by the amount read, spec.md §4.7.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let data = self.lock().stream_data(self.node)?;
        let pos = self.cursor.get() as usize;
        if pos >= data.len() {
            return Ok(0);
        }
        let n = (data.len() - pos).min(buf.len());
        buf[..n].copy_from_slice(&data[pos..pos + n]);
        self.cursor.set(self.cursor.get() + n as u64);
        Ok(n)
    }

    /// Reads starting at an explicit absolute offset, without touching the
    /// item's cursor.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let data = self.lock().stream_data(self.node)?;
        let pos = offset as usize;
        if pos >= data.len() {
            return Ok(0);
        }
        let n = (data.len() - pos).min(buf.len());
        buf[..n].copy_from_slice(&data[pos..pos + n]);
        Ok(n)
    }

    pub fn seek(&self, from: SeekFrom) -> Result<u64> {
        let len = self.size();
        let new_pos = crate::stream::resolve_seek(self.cursor.get(), len, from)?;
        self.cursor.set(new_pos);
        Ok(new_pos)
    }

    pub fn tell(&self) -> u64 {
        self.cursor.get()
    }

    /// Decodes this item's stream content as an MS-OLEPS property set,
    /// spec.md §4.8. Any item may be handed to this -- it is the caller's
    /// responsibility to only call it on SummaryInformation-shaped streams.
    pub fn as_property_set(&self) -> Result<PropertySet> {
        let (data, byte_order, lenient) = {
            let mut inner = self.lock();
            let data = inner.stream_data(self.node)?;
            (data, inner.header.byte_order, inner.lenient)
        };
        crate::propset::decode(&data, byte_order, lenient)
    }
}
