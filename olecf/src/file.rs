//! L7: the public façade, spec.md §6 ("Library public API").
//!
//! `OleFile` owns the header, the three reconstructed allocation tables,
//! the materialised mini-stream, and the assembled directory tree, all
//! behind a shared `Arc<Mutex<Inner>>` so that any number of `Item`
//! handles can be cheaply cloned out of it. This makes the open-file
//! handle `Sync` while each `Item`'s private `Cell<u64>` cursor keeps the
//! item itself `Send` but not `Sync`, exactly the split spec.md §5 calls
//! for.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::allocation::{read_msat, read_sat, read_ssat};
use crate::block_source::{BlockSource, FileBlockSource, MemoryBlockSource};
use crate::constants::{DOCUMENT_SUMMARY_INFORMATION_NAME, SID_FREE, SUMMARY_INFORMATION_NAME};
use crate::directory::{build_tree, parse_directory_entries, DirectoryEntry, NodeId, Tree};
use crate::error::Kind;
use crate::header::{parse_header, OleHeader};
use crate::item::Item;
use crate::stream::read_mini_stream;
use crate::Result;

/// A cooperating, advisory cancellation flag, spec.md §5. Checked at
/// coarse checkpoints during open (table reads, directory read); never
/// consulted mid-stream-read, matching the original C library's own
/// inconsistent use of it.
#[derive(Clone)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn new() -> Self {
        AbortHandle(Arc::new(AtomicBool::new(false)))
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_requested() {
            Err(crate::error::Error::runtime(
                Kind::AbortRequested,
                "open aborted by caller request",
            ))
        } else {
            Ok(())
        }
    }
}

impl Default for AbortHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for opening an OLECF file with non-default ASCII codepage,
/// lenient-mode toggle, or an abort handle, spec.md §6.
pub struct OpenOptions {
    codepage: &'static encoding_rs::Encoding,
    lenient: bool,
    abort: AbortHandle,
}

impl OpenOptions {
    pub fn new() -> Self {
        OpenOptions {
            codepage: encoding_rs::WINDOWS_1252,
            lenient: true,
            abort: AbortHandle::new(),
        }
    }

    pub fn codepage(mut self, codepage: &'static encoding_rs::Encoding) -> Self {
        self.codepage = codepage;
        self
    }

    /// Toggles the clipboard-size sentinel clamp quirk, spec.md §4.8/§9.
    /// Defaults to on, matching the original C library's unconditional
    /// behavior.
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    pub fn abort_handle(mut self, abort: AbortHandle) -> Self {
        self.abort = abort;
        self
    }

    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<OleFile> {
        let source = FileBlockSource::open(path)?;
        self.open_source(Box::new(source))
    }

    pub fn open_bytes(self, data: Vec<u8>) -> Result<OleFile> {
        self.open_source(Box::new(MemoryBlockSource::new(data)))
    }

    pub fn open_source(self, mut source: Box<dyn BlockSource + Send>) -> Result<OleFile> {
        let header = parse_header(source.as_mut())?;
        self.abort.check()?;

        let msat = read_msat(source.as_mut(), &header)?;
        self.abort.check()?;
        let sat = read_sat(source.as_mut(), &header, &msat)?;
        self.abort.check()?;

        let dir_raw = crate::allocation::read_chain(
            source.as_mut(),
            &header,
            &sat,
            header.root_directory_sector_identifier,
        )?;
        self.abort.check()?;
        let entries = parse_directory_entries(&dir_raw, header.byte_order, header.major_version)?;
        let tree = build_tree(entries)?;

        let root_entry = tree.root_id().map(|id| tree.node(id).entry.clone());
        let ssat = read_ssat(source.as_mut(), &header, &sat)?;
        self.abort.check()?;
        let mini_stream = match &root_entry {
            Some(root) => read_mini_stream(source.as_mut(), &header, &sat, root)?,
            None => Vec::new(),
        };

        let inner = Inner {
            source,
            header,
            sat,
            ssat,
            mini_stream,
            tree,
            lenient: self.lenient,
            codepage: self.codepage,
            cache: HashMap::new(),
        };

        Ok(OleFile {
            inner: Arc::new(Mutex::new(inner)),
        })
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct Inner {
    pub(crate) source: Box<dyn BlockSource + Send>,
    pub(crate) header: OleHeader,
    pub(crate) sat: Vec<u32>,
    pub(crate) ssat: Vec<u32>,
    pub(crate) mini_stream: Vec<u8>,
    pub(crate) tree: Tree,
    pub(crate) lenient: bool,
    pub(crate) codepage: &'static encoding_rs::Encoding,
    cache: HashMap<NodeId, Arc<Vec<u8>>>,
}

impl Inner {
    pub(crate) fn stream_data(&mut self, node: NodeId) -> Result<Vec<u8>> {
        if let Some(cached) = self.cache.get(&node) {
            return Ok((**cached).clone());
        }
        let entry: DirectoryEntry = self.tree.node(node).entry.clone();
        let data = crate::stream::read_stream_data(
            self.source.as_mut(),
            &self.header,
            &self.sat,
            &self.ssat,
            &self.mini_stream,
            &entry,
        )?;
        let rc = Arc::new(data);
        self.cache.insert(node, Arc::clone(&rc));
        Ok((*rc).clone())
    }
}

/// An open OLECF container, spec.md §6's "Library public API" surface.
#[derive(Clone)]
pub struct OleFile {
    inner: Arc<Mutex<Inner>>,
}

impl OleFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        OpenOptions::new().open(path)
    }

    pub fn open_bytes(data: Vec<u8>) -> Result<Self> {
        OpenOptions::new().open_bytes(data)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("olecf internal state mutex poisoned")
    }

    pub fn sector_size(&self) -> u32 {
        self.lock().header.sector_size
    }

    pub fn short_sector_size(&self) -> u32 {
        self.lock().header.short_sector_size
    }

    pub fn format_version(&self) -> (u16, u16) {
        let guard = self.lock();
        (guard.header.major_version, guard.header.minor_version)
    }

    pub fn codepage(&self) -> &'static encoding_rs::Encoding {
        self.lock().codepage
    }

    pub fn set_codepage(&self, codepage: &'static encoding_rs::Encoding) {
        self.lock().codepage = codepage;
    }

    /// Number of sectors marked `SID_FREE` in the reconstructed SAT.
    pub fn unallocated_sector_count(&self) -> usize {
        self.lock().sat.iter().filter(|&&s| s == SID_FREE).count()
    }

    /// The root storage item, or `None` if the directory stream contains
    /// no `ROOT_STORAGE` entry at all, spec.md §8.
    pub fn root(&self) -> Option<Item> {
        let node = self.lock().tree.root_id()?;
        Some(Item::new(Arc::clone(&self.inner), node))
    }

    pub fn item_by_path(&self, path: &str) -> Option<Item> {
        self.root()?.item_by_path(path)
    }

    /// The well-known `\005SummaryInformation` stream, if present, spec.md
    /// §6 ("Special directory names").
    pub fn summary_information(&self) -> Option<Item> {
        let node = self
            .lock()
            .tree
            .find_root_child_by_exact_name(SUMMARY_INFORMATION_NAME)?;
        Some(Item::new(Arc::clone(&self.inner), node))
    }

    pub fn document_summary_information(&self) -> Option<Item> {
        let node = self
            .lock()
            .tree
            .find_root_child_by_exact_name(DOCUMENT_SUMMARY_INFORMATION_NAME)?;
        Some(Item::new(Arc::clone(&self.inner), node))
    }

    /// Consumes the handle. Provided for API symmetry with `open`; there
    /// is no explicit close step beyond normal drop semantics.
    pub fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MinimalFileBuilder;

    #[test]
    fn opens_minimal_file_and_lists_root() {
        let bytes = MinimalFileBuilder::new()
            .with_stream("Data", vec![9u8; 200])
            .build();
        let file = OleFile::open_bytes(bytes).unwrap();
        assert_eq!(file.sector_size(), 512);
        let root = file.root().unwrap();
        assert!(root.is_root());
        assert_eq!(root.child_count(), 1);
        let child = root.child_by_name("data").unwrap();
        assert!(child.is_stream());
        assert_eq!(child.size(), 200);
    }

    #[test]
    fn reads_stream_contents() {
        let mut payload = vec![0u8; 5000];
        for (i, b) in payload.iter_mut().enumerate() {
            *b = (i % 251) as u8;
        }
        let bytes = MinimalFileBuilder::new()
            .with_stream("Big", payload.clone())
            .build();
        let file = OleFile::open_bytes(bytes).unwrap();
        let item = file.root().unwrap().child_by_name("Big").unwrap();
        let mut out = vec![0u8; payload.len()];
        let n = item.read(&mut out).unwrap();
        assert_eq!(n, payload.len());
        assert_eq!(out, payload);
        assert_eq!(item.read(&mut out).unwrap(), 0);
    }

    #[test]
    fn reads_mini_stream_contents() {
        let payload = vec![5u8; 40];
        let bytes = MinimalFileBuilder::new()
            .with_stream("Small", payload.clone())
            .build();
        let file = OleFile::open_bytes(bytes).unwrap();
        let item = file.root().unwrap().child_by_name("Small").unwrap();
        let mut out = vec![0u8; payload.len()];
        assert_eq!(item.read(&mut out).unwrap(), payload.len());
        assert_eq!(out, payload);
    }
}
