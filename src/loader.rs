//! Schema and document loading from JSON or YAML files.

use std::path::Path;

use serde_json::Value;

use crate::error::{LoadError, ValidateError};
use crate::schema::Schema;
use crate::types::{json_type_name, Document};

/// Serialization format of a schema or document source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

impl SourceFormat {
    /// Pick the format from a file extension: `.yaml`/`.yml` are YAML, anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                SourceFormat::Yaml
            }
            _ => SourceFormat::Json,
        }
    }
}

/// Parse `content` in the given format.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` or `LoadError::InvalidYaml` on syntax errors.
pub fn load_str(content: &str, format: SourceFormat) -> Result<Value, LoadError> {
    match format {
        SourceFormat::Json => {
            serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
        }
        SourceFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|source| LoadError::InvalidYaml { source })
        }
    }
}

/// Load a JSON or YAML file.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist, `LoadError::ReadError`
/// if it can't be read, or a parse error if its content is malformed.
pub fn load_file(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_str(&content, SourceFormat::from_path(path))
}

/// Load a document file; its top level must be a mapping.
pub fn load_document(path: &Path) -> Result<Document, LoadError> {
    match load_file(path)? {
        Value::Object(document) => Ok(document),
        other => Err(LoadError::NotAMapping {
            actual: json_type_name(&other).to_string(),
        }),
    }
}

/// Load and compile a schema file.
///
/// # Errors
///
/// Returns `ValidateError::Load` for unreadable files and `ValidateError::Config`
/// for malformed rules.
pub fn load_schema(path: &Path) -> Result<Schema, ValidateError> {
    let raw = load_file(path)?;
    tracing::debug!(path = %path.display(), "loaded schema");
    Ok(Schema::from_value(&raw)?)
}
