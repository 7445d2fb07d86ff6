//! Flattening an entry graph into relative-path file records.

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tracing::{debug, warn};

use zarrcheck_core::FileRecord;

use crate::entry::{DirectoryEntry, EntryNode};

/// Flatten `entry` into file records whose paths start with `path_prefix`.
///
/// Files are stamped `path_prefix + name`; a directory recurses with
/// `path_prefix + name + "/"`. Results keep the order in which children were
/// discovered. Sibling subtrees are awaited together and the returned future
/// resolves only once every one of them has.
///
/// Never fails: a file that cannot be opened or a directory that cannot be
/// listed contributes no records, and the failure is logged.
pub fn traverse(entry: EntryNode, path_prefix: String) -> BoxFuture<'static, Vec<FileRecord>> {
    async move {
        match entry {
            EntryNode::File(file) => {
                let relative_path = format!("{path_prefix}{}", file.name());
                match file.open().await {
                    Ok(opened) => {
                        debug!(path = %relative_path, size = opened.size, "file added");
                        vec![FileRecord::new(relative_path, opened.size, opened.content)]
                    }
                    Err(err) => {
                        warn!(path = %relative_path, error = %err, "failed to read file");
                        Vec::new()
                    }
                }
            }
            EntryNode::Directory(dir) => {
                let child_prefix = format!("{path_prefix}{}/", dir.name());
                let children = match read_all_children(dir.as_ref()).await {
                    Ok(children) => children,
                    Err(err) => {
                        warn!(path = %child_prefix, error = %err, "failed to read directory");
                        return Vec::new();
                    }
                };
                debug!(path = %child_prefix, entries = children.len(), "directory listed");

                let subtrees = children
                    .into_iter()
                    .map(|child| traverse(child, child_prefix.clone()));
                join_all(subtrees).await.into_iter().flatten().collect()
            }
            EntryNode::Other { name } => {
                let path = format!("{path_prefix}{name}");
                debug!(path = %path, "skipping non-file entry");
                Vec::new()
            }
        }
    }
    .boxed()
}

/// Flatten several top-level entries, e.g. every item of one drop.
pub async fn traverse_all(entries: Vec<EntryNode>) -> Vec<FileRecord> {
    let trees = entries
        .into_iter()
        .map(|entry| traverse(entry, String::new()));
    join_all(trees).await.into_iter().flatten().collect()
}

/// Drain a directory reader until it reports an empty batch.
async fn read_all_children(dir: &dyn DirectoryEntry) -> std::io::Result<Vec<EntryNode>> {
    let mut reader = dir.create_reader();
    let mut children = Vec::new();
    loop {
        let batch = reader.read_entries().await?;
        if batch.is_empty() {
            break;
        }
        children.extend(batch);
    }
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEntry;

    #[tokio::test]
    async fn test_single_file() {
        let entry = MemoryEntry::file(".zattrs", "{}").into_node(10);
        let files = traverse(entry, String::new()).await;

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path(), ".zattrs");
        assert_eq!(files[0].size(), 2);
    }

    #[tokio::test]
    async fn test_prefix_is_applied() {
        let entry = MemoryEntry::dir("nodes", vec![MemoryEntry::file("0", "x")]).into_node(10);
        let files = traverse(entry, "root/".to_string()).await;

        assert_eq!(files[0].relative_path(), "root/nodes/0");
    }

    #[tokio::test]
    async fn test_other_entries_contribute_nothing() {
        let entry = MemoryEntry::dir(
            "root",
            vec![MemoryEntry::other("socket"), MemoryEntry::file("a", "")],
        )
        .into_node(10);
        let files = traverse(entry, String::new()).await;

        let paths: Vec<&str> = files.iter().map(|f| f.relative_path()).collect();
        assert_eq!(paths, vec!["root/a"]);
    }

    #[tokio::test]
    async fn test_traverse_all_concatenates_roots() {
        let entries = vec![
            MemoryEntry::dir("a", vec![MemoryEntry::file("x", "")]).into_node(1),
            MemoryEntry::file("b", "").into_node(1),
        ];
        let files = traverse_all(entries).await;

        let paths: Vec<&str> = files.iter().map(|f| f.relative_path()).collect();
        assert_eq!(paths, vec!["a/x", "b"]);
    }
}
