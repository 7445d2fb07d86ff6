//! Host-exposed file and directory entries.
//!
//! A dropped folder arrives as a graph of entries rather than a flat list.
//! Each entry is either a file, a directory whose children are read through
//! a [`DirectoryReader`] in batches, or something else (sockets, devices,
//! unsupported link types) that contributes no files.

use std::fmt;
use std::io;
use std::sync::Arc;

use futures::future::BoxFuture;

use zarrcheck_core::FileContent;

/// Size and content of a file entry once it has been opened.
#[derive(Clone)]
pub struct OpenedFile {
    /// Size in bytes.
    pub size: u64,
    /// Lazily readable content.
    pub content: Arc<dyn FileContent>,
}

impl fmt::Debug for OpenedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedFile")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// A leaf file exposed by the host.
pub trait FileEntry: Send + Sync {
    /// Entry name (no path).
    fn name(&self) -> &str;

    /// Open the file, resolving its size and content handle.
    fn open(&self) -> BoxFuture<'_, io::Result<OpenedFile>>;
}

/// A directory exposed by the host.
pub trait DirectoryEntry: Send + Sync {
    /// Entry name (no path).
    fn name(&self) -> &str;

    /// Create a reader over this directory's children.
    fn create_reader(&self) -> Box<dyn DirectoryReader + '_>;
}

/// Paginated reader over a directory's children.
///
/// Hosts may hand out children across several calls; an empty batch marks
/// the end of the listing.
pub trait DirectoryReader: Send {
    /// Read the next batch of children.
    fn read_entries(&mut self) -> BoxFuture<'_, io::Result<Vec<EntryNode>>>;
}

/// A node in a host entry graph.
pub enum EntryNode {
    /// A regular file.
    File(Box<dyn FileEntry>),
    /// A directory.
    Directory(Box<dyn DirectoryEntry>),
    /// Anything else; contributes nothing to a traversal.
    Other {
        /// Entry name.
        name: String,
    },
}

impl EntryNode {
    /// Entry name (no path).
    pub fn name(&self) -> &str {
        match self {
            EntryNode::File(file) => file.name(),
            EntryNode::Directory(dir) => dir.name(),
            EntryNode::Other { name } => name,
        }
    }
}

impl fmt::Debug for EntryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryNode::File(file) => f.debug_tuple("File").field(&file.name()).finish(),
            EntryNode::Directory(dir) => f.debug_tuple("Directory").field(&dir.name()).finish(),
            EntryNode::Other { name } => f.debug_struct("Other").field("name", name).finish(),
        }
    }
}
