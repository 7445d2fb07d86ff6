//! Aggregate folder statistics.

use serde::{Deserialize, Serialize};

use crate::record::FileRecord;

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Name, file count and total size of an ingested folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSummary {
    /// First path segment shared by the files, or "Unknown".
    pub name: String,
    /// Number of files.
    pub file_count: usize,
    /// Human-readable total size.
    pub total_size: String,
    /// Total size in bytes.
    pub total_bytes: u64,
}

/// Summarize a flat file listing.
///
/// The folder name is taken from the first record; all records are assumed
/// to share one root segment.
pub fn summarize(files: &[FileRecord]) -> FolderSummary {
    let name = files
        .first()
        .and_then(|file| file.relative_path().split('/').next())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("Unknown")
        .to_string();

    let total_bytes: u64 = files.iter().map(FileRecord::size).sum();

    FolderSummary {
        name,
        file_count: files.len(),
        total_size: format_file_size(total_bytes),
        total_bytes,
    }
}

/// Format a byte count with 1024-based units and at most two decimals.
///
/// Trailing zeros are dropped, so 1536 bytes is `1.5 KB` and 1 GiB is `1 GB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut scale = 1u64;
    while unit < SIZE_UNITS.len() - 1 && bytes / scale >= 1024 {
        scale *= 1024;
        unit += 1;
    }

    let value = bytes as f64 / scale as f64;
    let rendered = format!("{value:.2}");
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{rendered} {}", SIZE_UNITS[unit])
}
