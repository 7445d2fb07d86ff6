use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use zarrcheck_core::MemoryContent;
use zarrcheck_scan::{
    DirectoryEntry, DirectoryReader, EntryNode, FileEntry, MemoryEntry, OpenedFile, traverse,
};

/// A file that takes a while to open.
struct SlowFile {
    name: String,
    delay: Duration,
}

impl FileEntry for SlowFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> BoxFuture<'_, io::Result<OpenedFile>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            Ok(OpenedFile {
                size: 1,
                content: Arc::new(MemoryContent::new("x")),
            })
        })
    }
}

/// A file whose read always fails.
struct BrokenFile;

impl FileEntry for BrokenFile {
    fn name(&self) -> &str {
        "broken"
    }

    fn open(&self) -> BoxFuture<'_, io::Result<OpenedFile>> {
        Box::pin(async { Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")) })
    }
}

/// A directory that can hand out one batch and then fails.
struct FlakyDirectory {
    reads: AtomicUsize,
}

impl DirectoryEntry for FlakyDirectory {
    fn name(&self) -> &str {
        "flaky"
    }

    fn create_reader(&self) -> Box<dyn DirectoryReader + '_> {
        Box::new(FlakyReader { dir: self })
    }
}

struct FlakyReader<'a> {
    dir: &'a FlakyDirectory,
}

impl DirectoryReader for FlakyReader<'_> {
    fn read_entries(&mut self) -> BoxFuture<'_, io::Result<Vec<EntryNode>>> {
        let call = self.dir.reads.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if call == 0 {
                Ok(vec![MemoryEntry::file("first", "a").into_node(1)])
            } else {
                Err(io::Error::other("listing interrupted"))
            }
        })
    }
}

/// A directory whose children are supplied directly.
struct FixedDirectory {
    name: String,
    children: std::sync::Mutex<Option<Vec<EntryNode>>>,
}

impl FixedDirectory {
    fn node(name: &str, children: Vec<EntryNode>) -> EntryNode {
        EntryNode::Directory(Box::new(Self {
            name: name.to_string(),
            children: std::sync::Mutex::new(Some(children)),
        }))
    }
}

impl DirectoryEntry for FixedDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_reader(&self) -> Box<dyn DirectoryReader + '_> {
        Box::new(FixedReader { dir: self })
    }
}

struct FixedReader<'a> {
    dir: &'a FixedDirectory,
}

impl DirectoryReader for FixedReader<'_> {
    fn read_entries(&mut self) -> BoxFuture<'_, io::Result<Vec<EntryNode>>> {
        let batch = self
            .dir
            .children
            .lock()
            .map(|mut guard| guard.take().unwrap_or_default())
            .unwrap_or_default();
        Box::pin(async move { Ok(batch) })
    }
}

fn paths(files: &[zarrcheck_core::FileRecord]) -> Vec<&str> {
    files.iter().map(|f| f.relative_path()).collect()
}

#[tokio::test]
async fn test_every_leaf_is_yielded_with_full_path() {
    let tree = MemoryEntry::dir(
        "graph.geff",
        vec![
            MemoryEntry::file(".zattrs", "{}"),
            MemoryEntry::dir(
                "nodes",
                vec![
                    MemoryEntry::dir("ids", vec![MemoryEntry::file("0", "1234")]),
                    MemoryEntry::dir(
                        "props",
                        vec![MemoryEntry::dir(
                            "t",
                            vec![
                                MemoryEntry::dir("values", vec![MemoryEntry::file("0", "")]),
                                MemoryEntry::file(".zattrs", "{}"),
                            ],
                        )],
                    ),
                ],
            ),
            MemoryEntry::dir("edges", vec![]),
        ],
    );

    let files = traverse(tree.into_node(2), String::new()).await;

    assert_eq!(
        paths(&files),
        vec![
            "graph.geff/.zattrs",
            "graph.geff/nodes/ids/0",
            "graph.geff/nodes/props/t/values/0",
            "graph.geff/nodes/props/t/.zattrs",
        ]
    );
}

#[tokio::test]
async fn test_multi_batch_directory_is_drained() {
    let children = (0..250)
        .map(|i| MemoryEntry::file(format!("{i}"), ""))
        .collect();
    let tree = MemoryEntry::dir("chunks", children);

    let files = traverse(tree.into_node(100), String::new()).await;

    assert_eq!(files.len(), 250);
    assert_eq!(files[0].relative_path(), "chunks/0");
    assert_eq!(files[249].relative_path(), "chunks/249");
}

#[tokio::test]
async fn test_slow_nested_leaf_does_not_drop_siblings() {
    let slow = EntryNode::File(Box::new(SlowFile {
        name: "slow".to_string(),
        delay: Duration::from_millis(50),
    }));
    let deep = FixedDirectory::node(
        "a",
        vec![FixedDirectory::node("b", vec![FixedDirectory::node("c", vec![slow])])],
    );
    let root = FixedDirectory::node(
        "root",
        vec![
            deep,
            MemoryEntry::file("sibling", "").into_node(1),
            MemoryEntry::dir("other", vec![MemoryEntry::file("leaf", "")]).into_node(1),
        ],
    );

    let files = traverse(root, String::new()).await;

    assert_eq!(
        paths(&files),
        vec!["root/a/b/c/slow", "root/sibling", "root/other/leaf"]
    );
}

#[tokio::test]
async fn test_failures_are_contained_to_their_subtree() {
    let root = FixedDirectory::node(
        "root",
        vec![
            EntryNode::File(Box::new(BrokenFile)),
            EntryNode::Directory(Box::new(FlakyDirectory {
                reads: AtomicUsize::new(0),
            })),
            MemoryEntry::file("ok", "").into_node(1),
        ],
    );

    let files = traverse(root, String::new()).await;

    assert_eq!(paths(&files), vec!["root/ok"]);
}
