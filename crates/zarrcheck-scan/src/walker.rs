//! JWalk-based flat listing of a folder.
//!
//! The folder-picker path: every file is listed with its relative path
//! already filled in, so no entry graph is involved.

use std::path::Path;
use std::sync::Arc;

use jwalk::WalkDir;
use tracing::{debug, warn};

use zarrcheck_core::{DiskContent, FileRecord, ScanConfig, ScanError, ScanWarning, WarningKind};

/// Records and non-fatal warnings from one walk.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Files sorted by relative path.
    pub files: Vec<FileRecord>,
    /// Entries that could not be read.
    pub warnings: Vec<ScanWarning>,
}

/// List every file below `config.root`.
///
/// Relative paths start with the root folder's own name, matching what
/// the entry-graph traversal produces for the same folder.
pub fn collect_files(config: &ScanConfig) -> Result<WalkOutcome, ScanError> {
    let root_path = config
        .root
        .canonicalize()
        .map_err(|e| ScanError::io(&config.root, e))?;

    if !root_path.is_dir() {
        return Err(ScanError::NotADirectory { path: root_path });
    }

    let root_name = root_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let ignore = config.ignore_matcher()?;
    let walker = WalkDir::new(&root_path)
        .skip_hidden(!config.include_hidden)
        .follow_links(config.follow_symlinks)
        .sort(true)
        .min_depth(1)
        .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX))
        .process_read_dir(move |_depth, _path, _state, children| {
            children.retain(|child| match child {
                Ok(entry) => !ignore.is_ignored(&entry.file_name().to_string_lossy()),
                Err(_) => true,
            });
        });

    let mut outcome = WalkOutcome::default();

    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                warn!(path = %path.display(), error = %err, "walk error");
                let warning = match err.io_error() {
                    Some(io_err) => ScanWarning::from_io(path, io_err),
                    None => ScanWarning::new(path, err.to_string(), WarningKind::ReadError),
                };
                outcome.warnings.push(warning);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "metadata error");
                outcome.warnings.push(ScanWarning::new(
                    &path,
                    err.to_string(),
                    WarningKind::MetadataError,
                ));
                continue;
            }
        };

        let relative_path = relative_path(&root_name, &root_path, &path);
        debug!(path = %relative_path, size = metadata.len(), "file listed");
        outcome.files.push(FileRecord::new(
            relative_path,
            metadata.len(),
            Arc::new(DiskContent::new(path)),
        ));
    }

    outcome
        .files
        .sort_by(|a, b| a.relative_path().cmp(b.relative_path()));
    Ok(outcome)
}

/// Join the root name and the path components below the root with `/`.
fn relative_path(root_name: &str, root_path: &Path, path: &Path) -> String {
    let below = path.strip_prefix(root_path).unwrap_or(path);
    let mut relative = root_name.to_string();
    for component in below.components() {
        if !relative.is_empty() {
            relative.push('/');
        }
        relative.push_str(&component.as_os_str().to_string_lossy());
    }
    relative
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("edges/ids")).unwrap();
        fs::create_dir_all(root.join("scratch")).unwrap();
        fs::write(root.join(".zattrs"), "{}").unwrap();
        fs::write(root.join("edges/.zarray"), "{}").unwrap();
        fs::write(root.join("edges/ids/0.0"), "0123456789").unwrap();
        fs::write(root.join("scratch/notes.txt"), "x").unwrap();

        temp
    }

    #[test]
    fn test_relative_paths_include_root_name() {
        let temp = create_test_tree();
        let config = ScanConfig::new(temp.path());

        let outcome = collect_files(&config).unwrap();
        let root_name = temp.path().file_name().unwrap().to_string_lossy().to_string();

        let paths: Vec<&str> = outcome.files.iter().map(|f| f.relative_path()).collect();
        assert_eq!(paths.len(), 4);
        assert!(paths.iter().all(|p| p.starts_with(&format!("{root_name}/"))));
        assert!(paths.contains(&format!("{root_name}/edges/ids/0.0").as_str()));
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_sizes_recorded() {
        let temp = create_test_tree();
        let outcome = collect_files(&ScanConfig::new(temp.path())).unwrap();

        let chunk = outcome.files.iter().find(|f| f.name() == "0.0").unwrap();
        assert_eq!(chunk.size(), 10);
    }

    #[test]
    fn test_ignore_patterns_prune_directories() {
        let temp = create_test_tree();
        let config = ScanConfig::builder()
            .root(temp.path())
            .ignore_patterns(vec!["scratch".to_string()])
            .build()
            .unwrap();

        let outcome = collect_files(&config).unwrap();
        assert!(!outcome.files.iter().any(|f| f.name() == "notes.txt"));
        assert_eq!(outcome.files.len(), 3);
    }

    #[test]
    fn test_skip_hidden() {
        let temp = create_test_tree();
        let config = ScanConfig::builder()
            .root(temp.path())
            .include_hidden(false)
            .build()
            .unwrap();

        let outcome = collect_files(&config).unwrap();
        assert!(outcome.files.iter().all(|f| !f.name().starts_with('.')));
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp = create_test_tree();
        let config = ScanConfig::new(temp.path().join(".zattrs"));
        assert!(matches!(
            collect_files(&config),
            Err(ScanError::NotADirectory { .. })
        ));
    }
}
