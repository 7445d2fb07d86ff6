//! Zarr layout classification from file names alone.

use serde::{Deserialize, Serialize};

use zarrcheck_core::FileRecord;

const ARRAY_MARKER: &str = ".zarray";
const GROUP_MARKER: &str = ".zgroup";
const ATTRS_MARKER: &str = ".zattrs";
const CONSOLIDATED_MARKER: &str = ".zmetadata";

/// What the marker files say about a folder's Zarr layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZarrClassification {
    /// `v2`, `v3 (estimated)` or `Unknown`.
    pub version: String,
    /// Paths containing `.zarray`.
    pub array_count: usize,
    /// Paths containing `.zgroup`.
    pub group_count: usize,
    /// Any array, group or attribute marker seen.
    pub has_array_or_group_marker: bool,
    /// Any `.zmetadata` seen.
    pub has_consolidated_metadata: bool,
}

impl ZarrClassification {
    /// Whether any Zarr marker file was found.
    pub fn has_markers(&self) -> bool {
        self.has_array_or_group_marker || self.has_consolidated_metadata
    }
}

/// Classify a file set by substring matches on relative paths.
///
/// No JSON is parsed. A path matching several markers counts for each.
pub fn classify_zarr(files: &[FileRecord]) -> ZarrClassification {
    let mut array_count = 0;
    let mut group_count = 0;
    let mut has_attrs = false;
    let mut has_consolidated_metadata = false;

    for file in files {
        let path = file.relative_path();
        if path.contains(ARRAY_MARKER) {
            array_count += 1;
        }
        if path.contains(GROUP_MARKER) {
            group_count += 1;
        }
        has_attrs |= path.contains(ATTRS_MARKER);
        has_consolidated_metadata |= path.contains(CONSOLIDATED_MARKER);
    }

    let has_array_or_group_marker = array_count > 0 || group_count > 0 || has_attrs;
    let version = if has_consolidated_metadata {
        "v2"
    } else if has_array_or_group_marker {
        "v3 (estimated)"
    } else {
        "Unknown"
    };

    ZarrClassification {
        version: version.to_string(),
        array_count,
        group_count,
        has_array_or_group_marker,
        has_consolidated_metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(paths: &[&str]) -> Vec<FileRecord> {
        paths.iter().map(|p| FileRecord::in_memory(*p, "{}")).collect()
    }

    #[test]
    fn test_empty_set() {
        let result = classify_zarr(&[]);
        assert_eq!(result.version, "Unknown");
        assert_eq!(result.array_count, 0);
        assert_eq!(result.group_count, 0);
        assert!(!result.has_markers());
    }

    #[test]
    fn test_counts_without_consolidated_metadata() {
        let files = records(&[
            "store/.zgroup",
            "store/a/.zarray",
            "store/a/0.0",
            "store/b/.zarray",
        ]);
        let result = classify_zarr(&files);

        assert_eq!(result.array_count, 2);
        assert_eq!(result.group_count, 1);
        assert_eq!(result.version, "v3 (estimated)");
        assert!(result.has_array_or_group_marker);
        assert!(!result.has_consolidated_metadata);
    }

    #[test]
    fn test_consolidated_metadata_means_v2() {
        let files = records(&["store/.zmetadata", "store/.zgroup"]);
        assert_eq!(classify_zarr(&files).version, "v2");

        let alone = records(&["store/.zmetadata"]);
        let result = classify_zarr(&alone);
        assert_eq!(result.version, "v2");
        assert!(result.has_markers());
    }

    #[test]
    fn test_attrs_alone_is_a_marker() {
        let result = classify_zarr(&records(&["store/.zattrs"]));
        assert_eq!(result.version, "v3 (estimated)");
        assert_eq!(result.array_count, 0);
    }

    #[test]
    fn test_substring_match_counts_every_pattern() {
        let result = classify_zarr(&records(&["odd/.zarray.zgroup"]));
        assert_eq!(result.array_count, 1);
        assert_eq!(result.group_count, 1);
    }

    #[test]
    fn test_plain_files_are_unknown() {
        let result = classify_zarr(&records(&["folder/readme.md", "folder/data.csv"]));
        assert_eq!(result.version, "Unknown");
        assert!(!result.has_markers());
    }
}
