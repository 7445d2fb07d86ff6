//! Local filesystem exposed as an entry graph.
//!
//! Directories are listed lazily with `tokio::fs::read_dir` and handed out
//! in batches of [`ScanConfig::read_batch_size`], the same shape a drag-and-drop
//! host produces. At most [`ScanConfig::max_open_dirs`] listings are open at
//! once; the rest wait for a slot.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::warn;

use zarrcheck_core::{DiskContent, IgnoreMatcher, ScanConfig, ScanError};

use crate::entry::{DirectoryEntry, DirectoryReader, EntryNode, FileEntry, OpenedFile};

/// Settings shared by every node of one filesystem graph.
#[derive(Debug)]
struct FsContext {
    config: ScanConfig,
    batch_size: usize,
    ignore: IgnoreMatcher,
    open_dirs: Semaphore,
}

/// Expose `root` as an entry graph.
///
/// The root may be a file or a directory. Hidden-file, ignore, depth and
/// symlink settings are applied while children are listed. A followed
/// symlink that points back at one of its own ancestors is not entered.
pub async fn fs_entry(root: &Path, config: &ScanConfig) -> Result<EntryNode, ScanError> {
    let root = tokio::fs::canonicalize(root)
        .await
        .map_err(|e| ScanError::io(root, e))?;
    let metadata = tokio::fs::metadata(&root)
        .await
        .map_err(|e| ScanError::io(&root, e))?;

    let ctx = Arc::new(FsContext {
        config: config.clone(),
        batch_size: config.read_batch_size.max(1),
        ignore: config.ignore_matcher()?,
        open_dirs: Semaphore::new(config.max_open_dirs.max(1)),
    });

    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.to_string_lossy().into_owned());

    let node = if metadata.is_dir() {
        EntryNode::Directory(Box::new(FsDirectory {
            name,
            path: root.clone(),
            ancestors: vec![root],
            depth: 0,
            ctx,
        }))
    } else if metadata.is_file() {
        EntryNode::File(Box::new(FsFile { name, path: root }))
    } else {
        EntryNode::Other { name }
    };
    Ok(node)
}

struct FsFile {
    name: String,
    path: PathBuf,
}

impl FileEntry for FsFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> BoxFuture<'_, io::Result<OpenedFile>> {
        Box::pin(async move {
            let metadata = tokio::fs::metadata(&self.path).await?;
            Ok(OpenedFile {
                size: metadata.len(),
                content: Arc::new(DiskContent::new(&self.path)),
            })
        })
    }
}

struct FsDirectory {
    name: String,
    path: PathBuf,
    /// Canonical paths from the root down to this directory, inclusive.
    ancestors: Vec<PathBuf>,
    depth: u32,
    ctx: Arc<FsContext>,
}

impl FsDirectory {
    fn canonical_path(&self) -> &Path {
        self.ancestors.last().map_or(self.path.as_path(), PathBuf::as_path)
    }

    fn subdirectory(&self, name: String, path: PathBuf, canonical: PathBuf) -> EntryNode {
        let mut ancestors = self.ancestors.clone();
        ancestors.push(canonical);
        EntryNode::Directory(Box::new(FsDirectory {
            name,
            path,
            ancestors,
            depth: self.depth + 1,
            ctx: Arc::clone(&self.ctx),
        }))
    }

    /// Turn a listed child into a node, or `None` when it is filtered out.
    async fn child_node(&self, entry: tokio::fs::DirEntry) -> Option<EntryNode> {
        let name = entry.file_name().to_string_lossy().into_owned();
        if self.ctx.config.should_skip_hidden(&name) || self.ctx.ignore.is_ignored(&name) {
            return None;
        }

        let path = entry.path();
        let file_type = match entry.file_type().await {
            Ok(file_type) => file_type,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read file type");
                return None;
            }
        };

        if !file_type.is_symlink() {
            let node = if file_type.is_dir() {
                let canonical = self.canonical_path().join(&name);
                self.subdirectory(name, path, canonical)
            } else if file_type.is_file() {
                EntryNode::File(Box::new(FsFile { name, path }))
            } else {
                EntryNode::Other { name }
            };
            return Some(node);
        }

        if !self.ctx.config.follow_symlinks {
            return Some(EntryNode::Other { name });
        }
        let target = match tokio::fs::metadata(&path).await {
            Ok(target) => target,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "broken symlink");
                return Some(EntryNode::Other { name });
            }
        };

        if target.is_file() {
            return Some(EntryNode::File(Box::new(FsFile { name, path })));
        }
        if !target.is_dir() {
            return Some(EntryNode::Other { name });
        }

        let canonical = match tokio::fs::canonicalize(&path).await {
            Ok(canonical) => canonical,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot resolve symlink");
                return Some(EntryNode::Other { name });
            }
        };
        if self.ancestors.contains(&canonical) {
            warn!(
                path = %path.display(),
                target = %canonical.display(),
                "symlink loop, not following"
            );
            return Some(EntryNode::Other { name });
        }
        Some(self.subdirectory(name, path, canonical))
    }
}

impl DirectoryEntry for FsDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_reader(&self) -> Box<dyn DirectoryReader + '_> {
        Box::new(FsReader {
            dir: self,
            inner: None,
            done: false,
        })
    }
}

struct FsReader<'a> {
    dir: &'a FsDirectory,
    /// The open listing and the slot it occupies.
    inner: Option<(tokio::fs::ReadDir, SemaphorePermit<'a>)>,
    done: bool,
}

impl DirectoryReader for FsReader<'_> {
    fn read_entries(&mut self) -> BoxFuture<'_, io::Result<Vec<EntryNode>>> {
        Box::pin(async move {
            if self.done {
                return Ok(Vec::new());
            }

            let dir = self.dir;
            if self.inner.is_none() {
                let at_limit = dir
                    .ctx
                    .config
                    .max_depth
                    .is_some_and(|max| dir.depth >= max);
                if at_limit {
                    self.done = true;
                    return Ok(Vec::new());
                }
                let permit = dir.ctx.open_dirs.acquire().await.map_err(io::Error::other)?;
                let read_dir = tokio::fs::read_dir(&dir.path).await?;
                self.inner = Some((read_dir, permit));
            }
            let Some((read_dir, _)) = self.inner.as_mut() else {
                return Ok(Vec::new());
            };

            // Filtered children do not count towards the batch, so an empty
            // batch is only returned once the listing is exhausted.
            let mut batch = Vec::new();
            let mut exhausted = false;
            while batch.len() < dir.ctx.batch_size {
                match read_dir.next_entry().await? {
                    Some(entry) => {
                        if let Some(node) = dir.child_node(entry).await {
                            batch.push(node);
                        }
                    }
                    None => {
                        exhausted = true;
                        break;
                    }
                }
            }
            if exhausted {
                self.done = true;
                self.inner = None;
            }
            Ok(batch)
        })
    }
}
