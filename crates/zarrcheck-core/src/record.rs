//! Flat file records and their lazily-readable content.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Source of a file's bytes, read on demand.
pub trait FileContent: Send + Sync {
    /// Read the full content as bytes.
    fn read_bytes(&self) -> BoxFuture<'_, io::Result<Vec<u8>>>;

    /// Read the full content as text, replacing invalid UTF-8 sequences.
    fn read_text(&self) -> BoxFuture<'_, io::Result<String>> {
        Box::pin(async move {
            let bytes = self.read_bytes().await?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        })
    }
}

/// Content already held in memory.
#[derive(Debug, Clone)]
pub struct MemoryContent(Arc<[u8]>);

impl MemoryContent {
    /// Wrap the given bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self(bytes.into())
    }

    /// Number of bytes held.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no bytes are held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FileContent for MemoryContent {
    fn read_bytes(&self) -> BoxFuture<'_, io::Result<Vec<u8>>> {
        Box::pin(async move { Ok(self.0.to_vec()) })
    }
}

/// Content backed by a file on disk.
#[derive(Debug, Clone)]
pub struct DiskContent {
    path: PathBuf,
}

impl DiskContent {
    /// Reference the file at `path`; nothing is read until requested.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FileContent for DiskContent {
    fn read_bytes(&self) -> BoxFuture<'_, io::Result<Vec<u8>>> {
        Box::pin(tokio::fs::read(&self.path))
    }
}

/// A leaf file with its reconstructed, root-relative path.
///
/// `relative_path` is slash separated and unique within one traversal.
/// Equality compares path and size; content is not read.
#[derive(Clone)]
pub struct FileRecord {
    relative_path: String,
    size: u64,
    content: Arc<dyn FileContent>,
}

impl FileRecord {
    /// Create a record from its parts.
    pub fn new(relative_path: impl Into<String>, size: u64, content: Arc<dyn FileContent>) -> Self {
        Self {
            relative_path: relative_path.into(),
            size,
            content,
        }
    }

    /// Create a record whose content lives in memory.
    pub fn in_memory(relative_path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let content = MemoryContent::new(bytes);
        let size = content.len() as u64;
        Self::new(relative_path, size, Arc::new(content))
    }

    /// Root-relative, slash separated path.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Final path segment.
    pub fn name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }

    /// Path of the containing folder (empty for top-level files).
    pub fn folder_path(&self) -> &str {
        match self.relative_path.rfind('/') {
            Some(idx) => &self.relative_path[..idx],
            None => "",
        }
    }

    /// Read the content as text.
    pub async fn read_text(&self) -> io::Result<String> {
        self.content.read_text().await
    }
}

impl fmt::Debug for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRecord")
            .field("relative_path", &self.relative_path)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl PartialEq for FileRecord {
    fn eq(&self, other: &Self) -> bool {
        self.relative_path == other.relative_path && self.size == other.size
    }
}

impl Eq for FileRecord {}

impl Serialize for FileRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FileRecord", 2)?;
        state.serialize_field("relative_path", &self.relative_path)?;
        state.serialize_field("size", &self.size)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_folder_path() {
        let record = FileRecord::in_memory("root/graph/.zattrs", "{}");
        assert_eq!(record.name(), ".zattrs");
        assert_eq!(record.folder_path(), "root/graph");
        assert_eq!(record.size(), 2);

        let top = FileRecord::in_memory("README", "");
        assert_eq!(top.name(), "README");
        assert_eq!(top.folder_path(), "");
    }

    #[test]
    fn test_equality_ignores_content() {
        let a = FileRecord::in_memory("root/a", "xy");
        let b = FileRecord::in_memory("root/a", "zw");
        assert_eq!(a, b);
        assert_ne!(a, FileRecord::in_memory("root/b", "xy"));
    }

    #[tokio::test]
    async fn test_read_text_is_lossy() {
        let record = FileRecord::in_memory("root/bad", vec![b'o', b'k', 0xff]);
        let text = record.read_text().await.unwrap();
        assert!(text.starts_with("ok"));
        assert_eq!(text.chars().count(), 3);
    }

    #[tokio::test]
    async fn test_disk_content_reads_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "{\"geff\": {}}").unwrap();

        let content = DiskContent::new(temp.path());
        assert_eq!(content.read_text().await.unwrap(), "{\"geff\": {}}");
    }
}
