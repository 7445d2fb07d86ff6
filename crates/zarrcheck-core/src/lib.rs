//! Core types and configuration for zarrcheck.
//!
//! This crate provides the data structures shared by the ingestion and
//! validation crates: flat file records with lazily-read content, folder
//! summaries, the rebuilt path tree, configuration and error types.

mod config;
mod error;
mod record;
mod summary;
mod tree;

pub use config::{
    DEFAULT_MAX_OPEN_DIRS, DEFAULT_READ_BATCH_SIZE, DEFAULT_SCHEMA_SOURCE, IgnoreMatcher, ScanConfig, ScanConfigBuilder,
    ValidateConfig, ValidateConfigBuilder,
};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use record::{DiskContent, FileContent, FileRecord, MemoryContent};
pub use summary::{FolderSummary, format_file_size, summarize};
pub use tree::{PathTree, TreeEntry};
