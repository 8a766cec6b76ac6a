//! Error types for schema compilation, loading and rule evaluation.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::ValidationOutcome;

/// Errors raised while compiling a schema. The schema itself is at fault.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("schema must be a mapping of field names to rules, got {actual}")]
    SchemaNotMapping { actual: String },

    #[error("field '{field}': rules must be a mapping, got {actual}")]
    RulesNotMapping { field: String, actual: String },

    #[error("field '{field}': {keyword} expects {expected}, got {actual}")]
    InvalidKeywordType {
        field: String,
        keyword: String,
        expected: String,
        actual: String,
    },

    #[error("field '{field}': invalid date pattern \"{pattern}\"")]
    InvalidDatePattern { field: String, pattern: String },

    #[error("field '{field}': cannot parse daterange bound \"{bound}\"")]
    InvalidDateBound { field: String, bound: String },

    #[error("field '{field}': daterange minimum {min} is after maximum {max}")]
    InvertedDateRange {
        field: String,
        min: NaiveDate,
        max: NaiveDate,
    },

    #[error("field '{field}': delimiter must be a non-empty string")]
    InvalidDelimiter { field: String },

    #[error("field '{field}': unsupported numberformat \"{pattern}\": expected .Nf")]
    InvalidNumberFormat { field: String, pattern: String },

    #[error("field '{field}': minimum {minimum} is greater than maximum {maximum}")]
    InvertedBounds {
        field: String,
        minimum: f64,
        maximum: f64,
    },

    #[error("field '{field}': unknown {keyword} option '{option}'")]
    UnknownOption {
        field: String,
        keyword: String,
        option: String,
    },

    #[error("field '{field}': invalid if block: {message}")]
    InvalidConditional { field: String, message: String },
}

impl ConfigError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }

    /// The schema field whose rules are malformed, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::SchemaNotMapping { .. } => None,
            ConfigError::RulesNotMapping { field, .. }
            | ConfigError::InvalidKeywordType { field, .. }
            | ConfigError::InvalidDatePattern { field, .. }
            | ConfigError::InvalidDateBound { field, .. }
            | ConfigError::InvertedDateRange { field, .. }
            | ConfigError::InvalidDelimiter { field }
            | ConfigError::InvalidNumberFormat { field, .. }
            | ConfigError::InvertedBounds { field, .. }
            | ConfigError::UnknownOption { field, .. }
            | ConfigError::InvalidConditional { field, .. } => Some(field.as_str()),
        }
    }
}

/// Errors reading schema or document files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML: {source}")]
    InvalidYaml {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("expected a mapping at the top level, got {actual}")]
    NotAMapping { actual: String },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}

/// Failures of the `daterange` and `dateformat` rules.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DateError {
    #[error("value \"{value}\" does not match any of the formats {}", attempted.join(", "))]
    FormatMismatch {
        value: String,
        attempted: Vec<String>,
    },

    #[error("cannot parse \"{value}\" as a date")]
    ParseError { value: String },

    #[error("date {actual} is outside the range {min} to {max}")]
    RangeError {
        min: NaiveDate,
        max: NaiveDate,
        actual: NaiveDate,
    },
}

/// Failure of a single token of a `delimitedValues` field.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TokenError {
    #[error("value \"{token}\" does not match number format {format}")]
    Format { token: String, format: String },

    #[error("value \"{token}\" is below the minimum {minimum}")]
    BelowMinimum { token: String, minimum: f64 },

    #[error("value \"{token}\" is above the maximum {maximum}")]
    AboveMaximum { token: String, maximum: f64 },

    #[error("value \"{token}\" is not one of {}", allowed.join(", "))]
    NotAllowed { token: String, allowed: Vec<String> },
}

/// Failures of the `type: json` and `type: uri` rules.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ContentError {
    #[error("invalid JSON: {message}")]
    JsonParse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("\"{value}\" is not an absolute URI (scheme://...)")]
    UriFormat { value: String },
}

/// Any rule failure, as reported for a field.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuleError {
    #[error(transparent)]
    Date(#[from] DateError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("{keyword} cannot check a value of type {actual}")]
    UnexpectedType {
        keyword: &'static str,
        actual: &'static str,
    },
}

/// Errors during validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("validation failed with {} error(s)", outcome.error_count())]
    Invalid { outcome: ValidationOutcome },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Config(e) => e.exit_code(),
            ValidateError::Load(e) => e.exit_code(),
            ValidateError::Invalid { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("schema.yaml"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = LoadError::NotAMapping {
            actual: "array".into(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn validate_error_exit_codes() {
        let mut outcome = ValidationOutcome::default();
        outcome.record("moment", "bad date");
        assert_eq!(ValidateError::Invalid { outcome }.exit_code(), 1);

        let err = ValidateError::from(ConfigError::InvalidDelimiter {
            field: "sex".into(),
        });
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn config_error_field() {
        let err = ConfigError::InvalidDelimiter {
            field: "sex".into(),
        };
        assert_eq!(err.field(), Some("sex"));
        let err = ConfigError::SchemaNotMapping {
            actual: "array".into(),
        };
        assert_eq!(err.field(), None);
    }

    #[test]
    fn date_error_display() {
        let err = DateError::FormatMismatch {
            value: "19970105".into(),
            attempted: vec!["%Y-%m-%d".into(), "%Y".into()],
        };
        assert_eq!(
            err.to_string(),
            "value \"19970105\" does not match any of the formats %Y-%m-%d, %Y"
        );
    }

    #[test]
    fn rule_error_is_transparent() {
        let err = RuleError::from(TokenError::AboveMaximum {
            token: "32".into(),
            maximum: 20.0,
        });
        assert_eq!(err.to_string(), "value \"32\" is above the maximum 20");
    }
}
