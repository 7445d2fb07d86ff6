//! Ingestion and validation configuration.

use std::path::PathBuf;

use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Default number of entries a directory reader hands out per batch.
pub const DEFAULT_READ_BATCH_SIZE: usize = 100;

/// Default cap on directories listed at the same time.
pub const DEFAULT_MAX_OPEN_DIRS: usize = 64;

/// Default location of the GEFF schema document.
pub const DEFAULT_SCHEMA_SOURCE: &str = "geff-schema.json";

/// Configuration for turning a folder into a flat file listing.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root folder to ingest.
    pub root: PathBuf,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Maximum depth to traverse (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Glob patterns matched against entry names; matches are skipped.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Entries per directory batch when the folder is exposed as an entry graph.
    #[builder(default = "DEFAULT_READ_BATCH_SIZE")]
    #[serde(default = "default_read_batch_size")]
    pub read_batch_size: usize,

    /// Directories whose listing may be open at the same time.
    #[builder(default = "DEFAULT_MAX_OPEN_DIRS")]
    #[serde(default = "default_max_open_dirs")]
    pub max_open_dirs: usize,
}

fn default_true() -> bool {
    true
}

fn default_read_batch_size() -> usize {
    DEFAULT_READ_BATCH_SIZE
}

fn default_max_open_dirs() -> usize {
    DEFAULT_MAX_OPEN_DIRS
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Root path cannot be empty".to_string());
            }
            None => return Err("Root path is required".to_string()),
            _ => {}
        }
        if self.read_batch_size == Some(0) {
            return Err("Read batch size must be at least 1".to_string());
        }
        if self.max_open_dirs == Some(0) {
            return Err("Open directory limit must be at least 1".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for a folder.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_symlinks: false,
            max_depth: None,
            ignore_patterns: Vec::new(),
            include_hidden: true,
            read_batch_size: DEFAULT_READ_BATCH_SIZE,
            max_open_dirs: DEFAULT_MAX_OPEN_DIRS,
        }
    }

    /// Compile the ignore patterns into a matcher.
    pub fn ignore_matcher(&self) -> Result<IgnoreMatcher, ScanError> {
        IgnoreMatcher::new(&self.ignore_patterns)
    }

    /// Check if hidden files should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Compiled ignore patterns, matched against single entry names.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    set: GlobSet,
}

impl IgnoreMatcher {
    /// Compile `patterns`; an invalid glob is a configuration error.
    pub fn new(patterns: &[String]) -> Result<Self, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|e| ScanError::InvalidConfig {
            message: e.to_string(),
        })?;
        Ok(Self { set })
    }

    /// Whether an entry with this name should be skipped.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.set.is_match(name)
    }
}

/// Configuration for the validation pipeline.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct ValidateConfig {
    /// Where the GEFF JSON Schema is loaded from: a file path or an http(s) URL.
    #[builder(default = "DEFAULT_SCHEMA_SOURCE.to_string()")]
    #[serde(default = "default_schema_source")]
    pub schema: String,

    /// The host is known to omit dotfiles from dropped folders.
    #[builder(default = "false")]
    #[serde(default)]
    pub omits_hidden_files: bool,
}

fn default_schema_source() -> String {
    DEFAULT_SCHEMA_SOURCE.to_string()
}

impl ValidateConfig {
    /// Create a new validate config builder.
    pub fn builder() -> ValidateConfigBuilder {
        ValidateConfigBuilder::default()
    }
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            schema: default_schema_source(),
            omits_hidden_files: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScanConfig::builder()
            .root("/data/tracks.zarr")
            .read_batch_size(8usize)
            .include_hidden(false)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/data/tracks.zarr"));
        assert_eq!(config.read_batch_size, 8);
        assert!(!config.include_hidden);
        assert!(!config.follow_symlinks);
    }

    #[test]
    fn test_config_builder_rejects_zero_batch() {
        let result = ScanConfig::builder()
            .root("/data")
            .read_batch_size(0usize)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_builder_open_dir_limit() {
        let config = ScanConfig::builder().root("/data").build().unwrap();
        assert_eq!(config.max_open_dirs, DEFAULT_MAX_OPEN_DIRS);

        let result = ScanConfig::builder()
            .root("/data")
            .max_open_dirs(0usize)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_ignore_matcher() {
        let config = ScanConfig::builder()
            .root("/data")
            .ignore_patterns(vec![".DS_Store".to_string(), "*.tmp".to_string()])
            .build()
            .unwrap();
        let matcher = config.ignore_matcher().unwrap();

        assert!(matcher.is_ignored(".DS_Store"));
        assert!(matcher.is_ignored("chunk.tmp"));
        assert!(!matcher.is_ignored(".zattrs"));
    }

    #[test]
    fn test_invalid_ignore_pattern() {
        let err = IgnoreMatcher::new(&["[unclosed".to_string()]).unwrap_err();
        assert!(matches!(err, ScanError::InvalidPattern { .. }));
    }

    #[test]
    fn test_should_skip_hidden() {
        let mut config = ScanConfig::new("/data");
        assert!(!config.should_skip_hidden(".zattrs"));

        config.include_hidden = false;
        assert!(config.should_skip_hidden(".zattrs"));
        assert!(!config.should_skip_hidden("values"));
    }

    #[test]
    fn test_validate_config_defaults() {
        let config = ValidateConfig::builder().build().unwrap();
        assert_eq!(config.schema, DEFAULT_SCHEMA_SOURCE);
        assert!(!config.omits_hidden_files);
    }
}
