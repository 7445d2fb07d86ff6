//! GEFF folder discovery and validation.
//!
//! A GEFF folder is any folder holding a `.zattrs` file whose JSON object
//! has a truthy `geff` value. Every such folder is validated against the
//! shared schema and the outcomes are rolled up into a
//! [`GeffValidationSummary`].

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;
use tracing::{debug, info, warn};

use zarrcheck_core::FileRecord;

use crate::schema::{SchemaCache, ValidationVerdict};

const ATTRS_FILE: &str = ".zattrs";

/// Shown when no GEFF metadata is found.
pub const NO_GEFF_MESSAGE: &str = "No GEFF folders found (no .zattrs files with geff metadata)";

/// Shown when no GEFF metadata is found and the host likely dropped dotfiles.
pub const HIDDEN_FILES_MESSAGE: &str =
    "Safari may have skipped hidden files (.zattrs) - try using Chrome/Firefox or the browse button";

/// Roll-up status of GEFF validation over a file set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum GeffStatus {
    /// Every GEFF folder passed.
    Valid,
    /// Some but not all GEFF folders passed.
    Partial,
    /// No GEFF folder passed.
    Invalid,
    /// No GEFF metadata was found.
    NoGeff,
    /// The schema could not be loaded.
    Error,
}

/// A folder whose `.zattrs` carries GEFF metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeffFolderCandidate {
    /// Path of the folder holding the `.zattrs` file.
    pub folder_path: String,
    /// The `geff` sub-object.
    pub metadata: Value,
    /// The whole parsed `.zattrs` object.
    pub full_metadata: Value,
    /// The `.zattrs` file itself.
    pub source_file: FileRecord,
}

impl GeffFolderCandidate {
    /// Build a candidate from a `.zattrs` record and its parsed contents.
    ///
    /// Returns `None` unless `parsed` is an object whose `geff` value is truthy:
    /// `null`, `false`, `0` and `""` do not count.
    pub fn from_attrs(source_file: &FileRecord, parsed: Value) -> Option<Self> {
        let metadata = parsed.get("geff").filter(|geff| is_truthy(geff))?.clone();
        Some(Self {
            folder_path: source_file.folder_path().to_string(),
            metadata,
            full_metadata: parsed,
            source_file: source_file.clone(),
        })
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A candidate together with its schema verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedGeffFolder {
    #[serde(flatten)]
    pub candidate: GeffFolderCandidate,
    pub validation: ValidationVerdict,
}

impl ValidatedGeffFolder {
    pub fn folder_path(&self) -> &str {
        &self.candidate.folder_path
    }

    pub fn is_valid(&self) -> bool {
        self.validation.is_valid
    }

    pub fn version(&self) -> &str {
        &self.validation.details.version
    }
}

/// Outcome of GEFF detection and validation over one file set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeffValidationSummary {
    pub status: GeffStatus,
    pub message: String,
    /// Validated folders in file order.
    pub geff_folders: Vec<ValidatedGeffFolder>,
    pub valid_folders: usize,
    pub total_folders: usize,
    /// Set when the no-GEFF result is blamed on a host that omits dotfiles.
    pub hidden_files_suspected: bool,
}

impl GeffValidationSummary {
    fn empty(status: GeffStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            geff_folders: Vec::new(),
            valid_folders: 0,
            total_folders: 0,
            hidden_files_suspected: false,
        }
    }

    /// Version reported for the whole set: the first valid folder's, else
    /// the first folder's, else "Unknown".
    pub fn version(&self) -> &str {
        self.geff_folders
            .iter()
            .find(|folder| folder.is_valid())
            .or_else(|| self.geff_folders.first())
            .map_or("Unknown", ValidatedGeffFolder::version)
    }
}

/// Finds GEFF folders in a file set and validates them.
#[derive(Debug, Clone)]
pub struct GeffDetector {
    schema: Arc<SchemaCache>,
    omits_hidden_files: bool,
}

impl GeffDetector {
    /// Create a detector sharing `schema`.
    ///
    /// `omits_hidden_files` tells the detector the host may have dropped
    /// dotfiles such as `.zattrs` while listing the folder.
    pub fn new(schema: Arc<SchemaCache>, omits_hidden_files: bool) -> Self {
        Self {
            schema,
            omits_hidden_files,
        }
    }

    /// The shared schema cache.
    pub fn schema(&self) -> &Arc<SchemaCache> {
        &self.schema
    }

    /// Read every `.zattrs` file and keep those carrying GEFF metadata.
    ///
    /// Unreadable files and malformed JSON are skipped.
    pub async fn find_geff_folders(files: &[FileRecord]) -> Vec<GeffFolderCandidate> {
        let attrs = files
            .iter()
            .filter(|file| file.relative_path().ends_with(ATTRS_FILE));

        let parsed = join_all(attrs.map(|file| async move {
            let text = match file.read_text().await {
                Ok(text) => text,
                Err(err) => {
                    warn!(path = file.relative_path(), error = %err, "failed to read attributes");
                    return None;
                }
            };
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => GeffFolderCandidate::from_attrs(file, value),
                Err(err) => {
                    debug!(path = file.relative_path(), error = %err, "skipping malformed attributes");
                    None
                }
            }
        }))
        .await;

        parsed.into_iter().flatten().collect()
    }

    /// Detect GEFF folders and validate each against the schema.
    pub async fn detect(&self, files: &[FileRecord]) -> GeffValidationSummary {
        let schema = match self.schema.get().await {
            Ok(schema) => schema,
            Err(err) => {
                warn!(error = %err, "schema unavailable");
                return GeffValidationSummary::empty(
                    GeffStatus::Error,
                    format!("Validation failed: {err}"),
                );
            }
        };

        let candidates = Self::find_geff_folders(files).await;
        if candidates.is_empty() {
            return self.no_geff(files);
        }

        let geff_folders: Vec<ValidatedGeffFolder> = candidates
            .into_iter()
            .map(|candidate| {
                let validation = schema.validate(&candidate.metadata);
                debug!(
                    folder = %candidate.folder_path,
                    valid = validation.is_valid,
                    errors = validation.errors.len(),
                    "GEFF folder validated"
                );
                ValidatedGeffFolder {
                    candidate,
                    validation,
                }
            })
            .collect();

        let total_folders = geff_folders.len();
        let valid_folders = geff_folders.iter().filter(|f| f.is_valid()).count();

        let (status, message) = if valid_folders == total_folders {
            (
                GeffStatus::Valid,
                format!("All {total_folders} GEFF folder(s) are valid"),
            )
        } else if valid_folders > 0 {
            (
                GeffStatus::Partial,
                format!("{valid_folders} of {total_folders} GEFF folders are valid"),
            )
        } else {
            (
                GeffStatus::Invalid,
                format!("All {total_folders} GEFF folder(s) have validation errors"),
            )
        };

        info!(%status, valid_folders, total_folders, "GEFF validation finished");

        GeffValidationSummary {
            status,
            message,
            geff_folders,
            valid_folders,
            total_folders,
            hidden_files_suspected: false,
        }
    }

    fn no_geff(&self, files: &[FileRecord]) -> GeffValidationSummary {
        let looks_like_zarr_data = files.iter().any(|file| {
            let path = file.relative_path();
            path.contains("values/") || path.contains("ids/")
        });

        if self.omits_hidden_files && looks_like_zarr_data {
            let mut summary = GeffValidationSummary::empty(GeffStatus::NoGeff, HIDDEN_FILES_MESSAGE);
            summary.hidden_files_suspected = true;
            summary
        } else {
            GeffValidationSummary::empty(GeffStatus::NoGeff, NO_GEFF_MESSAGE)
        }
    }
}
