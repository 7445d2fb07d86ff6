//! Validation for zarrcheck.
//!
//! Given the flat file listing of a folder, this crate answers two questions:
//!
//! - **Is it Zarr?** [`classify_zarr`] looks for `.zarray`, `.zgroup`,
//!   `.zattrs` and `.zmetadata` markers by name only.
//! - **Is it valid GEFF?** [`GeffDetector`] finds `.zattrs` files carrying a
//!   `geff` object and checks each against a JSON Schema loaded through a
//!   shared [`SchemaCache`].
//!
//! [`ValidationOrchestrator`] runs both and merges them into an
//! [`OverallResult`].
//!
//! # Example
//!
//! ```rust,no_run
//! use zarrcheck_core::{FileRecord, ValidateConfig};
//! use zarrcheck_validate::ValidationOrchestrator;
//!
//! # async fn run(files: Vec<FileRecord>) {
//! let orchestrator = ValidationOrchestrator::from_config(&ValidateConfig::default());
//! let result = orchestrator.orchestrate(&files).await;
//!
//! println!("{}: {}", result.status, result.message);
//! # }
//! ```

mod geff;
mod orchestrate;
mod schema;
mod zarr;

pub use geff::{
    GeffDetector, GeffFolderCandidate, GeffStatus, GeffValidationSummary, HIDDEN_FILES_MESSAGE,
    NO_GEFF_MESSAGE, ValidatedGeffFolder,
};
pub use orchestrate::{OverallResult, OverallStatus, ValidationOrchestrator};
pub use schema::{
    AxisSpec, CompiledSchema, SchemaCache, SchemaError, SchemaSource, SchemaViolation,
    ValidationVerdict, VerdictDetails, validate_metadata,
};
pub use zarr::{ZarrClassification, classify_zarr};
