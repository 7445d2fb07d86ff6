//! In-memory entry graphs.
//!
//! Used by hosts that already hold the dropped bytes, and to build fixtures.

use std::io;
use std::sync::Arc;

use futures::future::BoxFuture;

use zarrcheck_core::MemoryContent;

use crate::entry::{DirectoryEntry, DirectoryReader, EntryNode, FileEntry, OpenedFile};

/// An owned description of a file tree.
#[derive(Debug, Clone)]
pub enum MemoryEntry {
    /// A file with its bytes.
    File { name: String, data: MemoryContent },
    /// A directory with ordered children.
    Directory {
        name: String,
        children: Vec<MemoryEntry>,
    },
    /// An entry that is neither file nor directory.
    Other { name: String },
}

impl MemoryEntry {
    /// A file entry.
    pub fn file(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::File {
            name: name.into(),
            data: MemoryContent::new(data),
        }
    }

    /// A directory entry.
    pub fn dir(name: impl Into<String>, children: Vec<MemoryEntry>) -> Self {
        Self::Directory {
            name: name.into(),
            children,
        }
    }

    /// An entry of unsupported kind.
    pub fn other(name: impl Into<String>) -> Self {
        Self::Other { name: name.into() }
    }

    /// Expose as an entry graph whose directories list `batch_size` children per read.
    pub fn into_node(self, batch_size: usize) -> EntryNode {
        let batch_size = batch_size.max(1);
        match self {
            MemoryEntry::File { name, data } => EntryNode::File(Box::new(MemoryFile { name, data })),
            MemoryEntry::Directory { name, children } => EntryNode::Directory(Box::new(MemoryDirectory {
                name,
                children,
                batch_size,
            })),
            MemoryEntry::Other { name } => EntryNode::Other { name },
        }
    }
}

struct MemoryFile {
    name: String,
    data: MemoryContent,
}

impl FileEntry for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> BoxFuture<'_, io::Result<OpenedFile>> {
        Box::pin(async move {
            Ok(OpenedFile {
                size: self.data.len() as u64,
                content: Arc::new(self.data.clone()),
            })
        })
    }
}

struct MemoryDirectory {
    name: String,
    children: Vec<MemoryEntry>,
    batch_size: usize,
}

impl DirectoryEntry for MemoryDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_reader(&self) -> Box<dyn DirectoryReader + '_> {
        Box::new(MemoryReader {
            remaining: &self.children,
            batch_size: self.batch_size,
        })
    }
}

struct MemoryReader<'a> {
    remaining: &'a [MemoryEntry],
    batch_size: usize,
}

impl DirectoryReader for MemoryReader<'_> {
    fn read_entries(&mut self) -> BoxFuture<'_, io::Result<Vec<EntryNode>>> {
        let take = self.batch_size.min(self.remaining.len());
        let (batch, rest) = self.remaining.split_at(take);
        self.remaining = rest;
        let batch_size = self.batch_size;
        let nodes: Vec<EntryNode> = batch
            .iter()
            .cloned()
            .map(|entry| entry.into_node(batch_size))
            .collect();
        Box::pin(async move { Ok(nodes) })
    }
}
