//! GEFF schema loading, caching and validation.
//!
//! The schema document is an external input: nothing here hardcodes field
//! constraints. Metadata is always checked wrapped as `{"geff": <metadata>}`,
//! the shape the schema's root expects.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Errors that prevent the schema document from being obtained.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema file could not be read.
    #[error("cannot read schema '{source_name}': {source}")]
    Read {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    /// The schema document is not valid JSON.
    #[error("invalid JSON in schema '{source_name}': {source}")]
    Parse {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The schema could not be fetched over HTTP.
    #[error("Failed to load schema from {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// A URL was given but this build cannot fetch remote documents.
    #[error("cannot fetch schema from {url}: built without the remote-schema feature")]
    RemoteUnsupported { url: String },
}

/// Where the schema document comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaSource {
    /// A document already in memory.
    Inline(Value),
    /// A JSON file on disk.
    File(PathBuf),
    /// An http(s) URL.
    Url(String),
}

impl SchemaSource {
    /// Interpret a command-line style location: http(s) URLs are fetched,
    /// anything else is a file path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Url(location.to_string())
        } else {
            Self::File(PathBuf::from(location))
        }
    }

    /// Load and parse the document.
    pub async fn load(&self) -> Result<Value, SchemaError> {
        match self {
            Self::Inline(value) => Ok(value.clone()),
            Self::File(path) => {
                let source_name = path.display().to_string();
                let bytes = tokio::fs::read(path).await.map_err(|source| SchemaError::Read {
                    source_name: source_name.clone(),
                    source,
                })?;
                serde_json::from_slice(&bytes).map_err(|source| SchemaError::Parse { source_name, source })
            }
            Self::Url(url) => fetch_schema(url).await,
        }
    }
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(_) => write!(f, "<inline>"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

#[cfg(feature = "remote-schema")]
async fn fetch_schema(url: &str) -> Result<Value, SchemaError> {
    let fetch_error = |reason: String| SchemaError::Fetch {
        url: url.to_string(),
        reason,
    };

    let response = reqwest::get(url).await.map_err(|e| fetch_error(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(status.to_string()));
    }
    response.json::<Value>().await.map_err(|e| fetch_error(e.to_string()))
}

#[cfg(not(feature = "remote-schema"))]
async fn fetch_schema(url: &str) -> Result<Value, SchemaError> {
    Err(SchemaError::RemoteUnsupported {
        url: url.to_string(),
    })
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaViolation {
    /// JSON Pointer to the violating value in the wrapped instance (e.g. `/geff/axes/0`).
    pub instance_path: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "/: {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// One coordinate axis as declared in GEFF metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    /// Axis name.
    pub name: String,
    /// Axis type, e.g. `space` or `time`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Lower bound of the data range.
    pub min: Option<f64>,
    /// Upper bound of the data range.
    pub max: Option<f64>,
    /// Physical unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl AxisSpec {
    /// Read an axis leniently; missing or mistyped fields become empty.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            name: text("name").unwrap_or_default(),
            kind: text("type"),
            min: value.get("min").and_then(Value::as_f64),
            max: value.get("max").and_then(Value::as_f64),
            unit: text("unit"),
        }
    }
}

/// Facts read from the metadata regardless of validity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictDetails {
    /// `geff_version`, or "Unknown".
    pub version: String,
    /// `directed` exactly as given, whatever its type; `None` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directed: Option<Value>,
    /// Number of declared axes.
    pub axes_count: usize,
    /// Declared axes in order.
    pub axes: Vec<AxisSpec>,
}

impl VerdictDetails {
    /// Extract details from a `geff` metadata object.
    pub fn from_metadata(metadata: &Value) -> Self {
        let axes: Vec<AxisSpec> = metadata
            .get("axes")
            .and_then(Value::as_array)
            .map(|axes| axes.iter().map(AxisSpec::from_value).collect())
            .unwrap_or_default();

        Self {
            version: metadata
                .get("geff_version")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string(),
            directed: metadata.get("directed").cloned(),
            axes_count: axes.len(),
            axes,
        }
    }
}

/// Outcome of checking one metadata object against the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// Whether the schema accepted the metadata.
    pub is_valid: bool,
    /// Violations, empty when valid.
    pub errors: Vec<SchemaViolation>,
    /// Facts read from the input metadata.
    pub details: VerdictDetails,
}

/// A schema document with its compiled validator.
///
/// Compilation failures are kept rather than raised; every validation
/// against a schema that failed to compile reports one synthetic violation.
pub struct CompiledSchema {
    validator: Result<Validator, String>,
}

impl CompiledSchema {
    /// Compile a schema document.
    pub fn compile(document: &Value) -> Self {
        let validator = jsonschema::validator_for(document).map_err(|e| e.to_string());
        if let Err(ref reason) = validator {
            debug!(%reason, "schema failed to compile");
        }
        Self { validator }
    }

    /// Check `{"geff": metadata}` against the schema.
    pub fn validate(&self, metadata: &Value) -> ValidationVerdict {
        let details = VerdictDetails::from_metadata(metadata);

        let validator = match self.validator {
            Ok(ref validator) => validator,
            Err(ref reason) => {
                return ValidationVerdict {
                    is_valid: false,
                    errors: vec![SchemaViolation {
                        instance_path: String::new(),
                        message: format!("Validation error: {reason}"),
                    }],
                    details,
                };
            }
        };

        let instance = json!({ "geff": metadata });
        let errors: Vec<SchemaViolation> = validator
            .iter_errors(&instance)
            .map(|e| SchemaViolation {
                instance_path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        ValidationVerdict {
            is_valid: errors.is_empty(),
            errors,
            details,
        }
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("compiled", &self.validator.is_ok())
            .finish_non_exhaustive()
    }
}

/// Validate one metadata object against a schema document, compiling it on the spot.
///
/// Prefer [`SchemaCache`] when validating many objects.
pub fn validate_metadata(metadata: &Value, schema: &Value) -> ValidationVerdict {
    CompiledSchema::compile(schema).validate(metadata)
}

/// Lazily loaded, compiled schema shared by validation runs.
///
/// The first successful load is kept and reused read-only; a failed load
/// leaves the cache empty so a later call tries again.
#[derive(Debug)]
pub struct SchemaCache {
    source: SchemaSource,
    compiled: OnceCell<Arc<CompiledSchema>>,
}

impl SchemaCache {
    /// Create an empty cache for `source`.
    pub fn new(source: SchemaSource) -> Self {
        Self {
            source,
            compiled: OnceCell::new(),
        }
    }

    /// Create a cache around a document already in memory.
    pub fn from_document(document: Value) -> Self {
        Self::new(SchemaSource::Inline(document))
    }

    /// Whether a compiled schema is already held.
    pub fn is_loaded(&self) -> bool {
        self.compiled.initialized()
    }

    /// Get the compiled schema, loading it on first use.
    pub async fn get(&self) -> Result<Arc<CompiledSchema>, SchemaError> {
        let compiled = self
            .compiled
            .get_or_try_init(|| async {
                let document = self.source.load().await?;
                info!(source = %self.source, "schema loaded");
                Ok::<_, SchemaError>(Arc::new(CompiledSchema::compile(&document)))
            })
            .await?;
        Ok(Arc::clone(compiled))
    }
}
