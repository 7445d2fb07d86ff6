//! Folder ingestion for zarrcheck.
//!
//! A folder reaches the validator in one of two shapes:
//!
//! - **Entry graph** (drag-and-drop style): an [`EntryNode`] tree whose
//!   directories list children in batches. [`traverse`] flattens it into
//!   [`FileRecord`]s, rebuilding each relative path from ancestor names.
//! - **Flat listing** (folder-picker style): [`collect_files`] walks a local
//!   folder in parallel with jwalk and fills in relative paths directly.
//!
//! # Example
//!
//! ```rust,no_run
//! use zarrcheck_scan::{ScanConfig, fs_entry, traverse};
//!
//! # async fn run() -> Result<(), zarrcheck_scan::ScanError> {
//! let config = ScanConfig::new("/data/tracks.geff");
//! let root = fs_entry(&config.root, &config).await?;
//! let files = traverse(root, String::new()).await;
//!
//! for file in &files {
//!     println!("{} ({} bytes)", file.relative_path(), file.size());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Traversal never fails as a whole: unreadable files and directories are
//! logged through `tracing` and contribute nothing.

mod entry;
mod fs_entry;
mod memory;
mod traverse;
mod walker;

pub use entry::{DirectoryEntry, DirectoryReader, EntryNode, FileEntry, OpenedFile};
pub use fs_entry::fs_entry;
pub use memory::MemoryEntry;
pub use traverse::{traverse, traverse_all};
pub use walker::{WalkOutcome, collect_files};

// Re-export core types for convenience
pub use zarrcheck_core::{FileContent, FileRecord, ScanConfig, ScanError, ScanWarning, WarningKind};
