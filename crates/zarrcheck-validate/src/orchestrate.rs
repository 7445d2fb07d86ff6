//! Merge GEFF validation and Zarr classification into one verdict.

use std::sync::Arc;

use serde::Serialize;
use strum::Display;
use tracing::info;

use zarrcheck_core::{FileRecord, ValidateConfig};

use crate::geff::{GeffDetector, GeffStatus, GeffValidationSummary};
use crate::schema::{SchemaCache, SchemaSource};
use crate::zarr::classify_zarr;

/// Overall status of a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum OverallStatus {
    Valid,
    Partial,
    Warning,
    Invalid,
    Error,
}

impl OverallStatus {
    /// Whether the folder is usable as is.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Valid | Self::Warning)
    }
}

/// Final result for one folder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallResult {
    pub status: OverallStatus,
    pub message: String,
    pub version: String,
    pub array_count: usize,
    pub group_count: usize,
    /// GEFF detection outcome; always present for results built here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geff_validation: Option<GeffValidationSummary>,
}

/// Runs GEFF detection and Zarr classification over a file set.
#[derive(Debug, Clone)]
pub struct ValidationOrchestrator {
    detector: GeffDetector,
}

impl ValidationOrchestrator {
    pub fn new(detector: GeffDetector) -> Self {
        Self { detector }
    }

    /// Build an orchestrator with its own schema cache.
    pub fn from_config(config: &ValidateConfig) -> Self {
        let schema = Arc::new(SchemaCache::new(SchemaSource::parse(&config.schema)));
        Self::new(GeffDetector::new(schema, config.omits_hidden_files))
    }

    pub fn detector(&self) -> &GeffDetector {
        &self.detector
    }

    /// Validate a file set. Never fails; problems end up in the result.
    pub async fn orchestrate(&self, files: &[FileRecord]) -> OverallResult {
        let geff = self.detector.detect(files).await;
        let zarr = classify_zarr(files);

        let (status, message, version) = match geff.status {
            GeffStatus::Valid => (
                OverallStatus::Valid,
                format!("Valid GEFF dataset: {} folder(s) validated", geff.valid_folders),
                geff.geff_folders
                    .first()
                    .map_or_else(|| zarr.version.clone(), |f| f.version().to_string()),
            ),
            GeffStatus::Partial => (
                OverallStatus::Warning,
                geff.message.clone(),
                geff.version().to_string(),
            ),
            GeffStatus::NoGeff if zarr.has_markers() => (
                OverallStatus::Warning,
                "Zarr structure detected but no GEFF metadata found".to_string(),
                zarr.version.clone(),
            ),
            GeffStatus::NoGeff => {
                let message = if geff.hidden_files_suspected {
                    geff.message.clone()
                } else {
                    "Neither Zarr nor GEFF structure detected".to_string()
                };
                (OverallStatus::Invalid, message, zarr.version.clone())
            }
            GeffStatus::Invalid => (
                OverallStatus::Invalid,
                geff.message.clone(),
                geff.version().to_string(),
            ),
            GeffStatus::Error => (
                OverallStatus::Error,
                geff.message.clone(),
                zarr.version.clone(),
            ),
        };

        info!(%status, files = files.len(), "validation finished");

        OverallResult {
            status,
            message,
            version,
            array_count: zarr.array_count,
            group_count: zarr.group_count,
            geff_validation: Some(geff),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn orchestrator(omits_hidden_files: bool) -> ValidationOrchestrator {
        let schema = json!({
            "type": "object",
            "properties": {
                "geff": {"type": "object", "required": ["geff_version"]}
            }
        });
        let cache = Arc::new(SchemaCache::from_document(schema));
        ValidationOrchestrator::new(GeffDetector::new(cache, omits_hidden_files))
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(OverallStatus::Warning.to_string(), "warning");
        assert!(OverallStatus::Warning.is_success());
        assert!(!OverallStatus::Invalid.is_success());
    }

    #[tokio::test]
    async fn test_partial_becomes_warning() {
        let files = vec![
            FileRecord::in_memory("a/.zattrs", r#"{"geff": {}}"#),
            FileRecord::in_memory("b/.zattrs", r#"{"geff": {"geff_version": "0.4"}}"#),
        ];

        let result = orchestrator(false).orchestrate(&files).await;
        assert_eq!(result.status, OverallStatus::Warning);
        assert_eq!(result.message, "1 of 2 GEFF folders are valid");
        assert_eq!(result.version, "0.4");
    }

    #[tokio::test]
    async fn test_invalid_mirrors_geff_message() {
        let files = vec![FileRecord::in_memory("a/.zattrs", r#"{"geff": {}}"#)];

        let result = orchestrator(false).orchestrate(&files).await;
        assert_eq!(result.status, OverallStatus::Invalid);
        assert_eq!(result.message, "All 1 GEFF folder(s) have validation errors");
    }

    #[tokio::test]
    async fn test_nothing_recognised() {
        let files = vec![FileRecord::in_memory("folder/readme.md", "hi")];

        let result = orchestrator(false).orchestrate(&files).await;
        assert_eq!(result.status, OverallStatus::Invalid);
        assert_eq!(result.message, "Neither Zarr nor GEFF structure detected");
        assert_eq!(result.version, "Unknown");
        assert_eq!(result.array_count, 0);
    }

    #[tokio::test]
    async fn test_from_config_reports_missing_schema() {
        let config = ValidateConfig::builder()
            .schema("/no/such/geff-schema.json")
            .build()
            .unwrap();

        let result = ValidationOrchestrator::from_config(&config)
            .orchestrate(&[FileRecord::in_memory("a/.zattrs", "{}")])
            .await;
        assert_eq!(result.status, OverallStatus::Error);
        assert!(result.message.starts_with("Validation failed: "));
    }
}
