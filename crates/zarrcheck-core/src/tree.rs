//! Hierarchical view of a flat file listing.

use std::collections::BTreeMap;

use compact_str::CompactString;
use serde::Serialize;

use crate::record::FileRecord;

/// A directory or file in a [`PathTree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TreeEntry {
    /// A file leaf.
    File,
    /// A directory with named children.
    Directory(BTreeMap<CompactString, TreeEntry>),
}

impl TreeEntry {
    /// Check if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, TreeEntry::Directory(_))
    }
}

/// Folder hierarchy rebuilt from slash separated relative paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PathTree {
    roots: BTreeMap<CompactString, TreeEntry>,
}

impl PathTree {
    /// Build a tree from records.
    pub fn from_records(files: &[FileRecord]) -> Self {
        Self::from_paths(files.iter().map(FileRecord::relative_path))
    }

    /// Build a tree from relative paths.
    ///
    /// A name seen first as a file stays a file even if a later path uses
    /// it as a directory.
    pub fn from_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut roots = BTreeMap::new();

        for path in paths {
            let parts: Vec<&str> = path.split('/').collect();
            let mut current = &mut roots;
            for (i, part) in parts.iter().enumerate() {
                let is_last = i == parts.len() - 1;
                let entry = current.entry(CompactString::new(part)).or_insert_with(|| {
                    if is_last {
                        TreeEntry::File
                    } else {
                        TreeEntry::Directory(BTreeMap::new())
                    }
                });
                match entry {
                    TreeEntry::Directory(children) => current = children,
                    TreeEntry::File => break,
                }
            }
        }

        Self { roots }
    }

    /// Top-level entries.
    pub fn roots(&self) -> &BTreeMap<CompactString, TreeEntry> {
        &self.roots
    }

    /// Render as indented lines, directories before files, each group sorted
    /// by name ignoring case.
    pub fn render(&self) -> String {
        let mut out = String::new();
        render_level(&self.roots, 0, &mut out);
        out
    }
}

fn render_level(entries: &BTreeMap<CompactString, TreeEntry>, indent: usize, out: &mut String) {
    let mut ordered: Vec<_> = entries.iter().collect();
    // Stable, so names equal ignoring case keep their byte order.
    ordered.sort_by_cached_key(|(name, entry)| (!entry.is_dir(), name.to_lowercase()));

    for (name, entry) in ordered {
        out.push_str(&"  ".repeat(indent));
        match entry {
            TreeEntry::Directory(children) => {
                out.push_str(name);
                out.push_str("/\n");
                render_level(children, indent + 1, out);
            }
            TreeEntry::File => {
                out.push_str(name);
                out.push('\n');
            }
        }
    }
}
