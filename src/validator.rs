//! Document validation against compiled schemas.

use serde_json::Value;

use crate::dispatch::dispatch;
use crate::error::{LoadError, ValidateError};
use crate::schema::Schema;
use crate::types::{json_type_name, Document, ValidateOptions, ValidationOutcome};

/// Validates documents against one compiled schema.
///
/// The schema is never mutated, so a `Validator` can be shared across
/// threads and reused for any number of documents.
#[derive(Debug, Clone)]
pub struct Validator {
    schema: Schema,
    options: ValidateOptions,
}

impl Validator {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            options: ValidateOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ValidateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Check every schema field present in `document`.
    ///
    /// Fields are checked in schema order and every failure is recorded; a
    /// failing field never stops the others from being checked.
    pub fn validate(&self, document: &Document) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();

        for field in self.schema.fields() {
            let Some(value) = document.get(&field.name) else {
                continue;
            };
            for rule in &field.rules {
                dispatch(&field.name, rule, value, document, &mut outcome);
            }
        }

        if self.options.strict {
            for name in document.keys() {
                if !self.schema.contains(name) {
                    outcome.record(name, "unknown field");
                }
            }
        }

        if !outcome.valid {
            tracing::debug!(errors = outcome.error_count(), "document invalid");
        }
        outcome
    }
}

/// Validate a document against a raw schema mapping.
///
/// Compiles the schema, then validates the document against it.
///
/// # Errors
///
/// Returns `ValidateError::Config` if the schema is malformed,
/// `ValidateError::Load` if the document is not a mapping, or
/// `ValidateError::Invalid` if the document breaks any rule.
pub fn validate(
    schema: &Value,
    document: &Value,
    options: &ValidateOptions,
) -> Result<(), ValidateError> {
    let schema = Schema::from_value(schema)?;
    validate_against_schema(&schema, document, options)
}

/// Validate a document against an already-compiled schema.
///
/// Use this when validating many documents against the same schema.
pub fn validate_against_schema(
    schema: &Schema,
    document: &Value,
    options: &ValidateOptions,
) -> Result<(), ValidateError> {
    let Value::Object(document) = document else {
        return Err(LoadError::NotAMapping {
            actual: json_type_name(document).to_string(),
        }
        .into());
    };

    let validator = Validator::new(schema.clone()).with_options(options.clone());
    let outcome = validator.validate(document);

    if outcome.valid {
        Ok(())
    } else {
        Err(ValidateError::Invalid { outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validate_valid_document() {
        let schema = json!({ "moment": { "dateformat": ["%Y-%m-%d", "%Y"] } });
        let document = json!({ "moment": "1997" });
        assert!(validate(&schema, &document, &ValidateOptions::new()).is_ok());
    }

    #[test]
    fn validate_invalid_document() {
        let schema = json!({ "moment": { "daterange": ["1830-01-01", "2014-10-20"] } });
        let document = json!({ "moment": "20150831" });
        let result = validate(&schema, &document, &ValidateOptions::new());
        assert!(matches!(result, Err(ValidateError::Invalid { .. })));
    }

    #[test]
    fn absent_fields_are_skipped() {
        let schema = json!({ "location": { "type": "uri" } });
        assert!(validate(&schema, &json!({}), &ValidateOptions::new()).is_ok());
    }

    #[test]
    fn malformed_schema_fails_before_validation() {
        let schema = json!({ "moment": { "dateformat": "%Q" } });
        let result = validate(&schema, &json!({ "moment": "1997" }), &ValidateOptions::new());
        assert!(matches!(result, Err(ValidateError::Config(_))));
    }

    #[test]
    fn document_must_be_mapping() {
        let schema = json!({});
        let result = validate(&schema, &json!(["moment"]), &ValidateOptions::new());
        assert!(matches!(result, Err(ValidateError::Load(_))));
    }

    #[test]
    fn collects_errors_across_fields() {
        let schema = json!({
            "moment": { "dateformat": "%Y" },
            "location": { "type": "uri" },
            "perimeter": { "type": "json" }
        });
        let document = json!({
            "moment": "1997-01",
            "location": "https/example.org",
            "perimeter": "{\"top\": 3"
        });
        match validate(&schema, &document, &ValidateOptions::new()) {
            Err(ValidateError::Invalid { outcome }) => {
                assert_eq!(outcome.errors.len(), 3);
                assert_eq!(outcome.error_count(), 3);
            }
            other => panic!("expected validation error with 3 fields, got {:?}", other),
        }
    }

    #[test]
    fn strict_rejects_unknown_fields() {
        let schema = json!({ "perimeter": { "type": "json" } });
        let document = json!({ "size": "large", "perimeter": "{}" });

        assert!(validate(&schema, &document, &ValidateOptions::new()).is_ok());

        match validate(&schema, &document, &ValidateOptions::new().strict(true)) {
            Err(ValidateError::Invalid { outcome }) => {
                assert_eq!(outcome.field_errors("size"), ["unknown field"]);
            }
            other => panic!("expected unknown field error, got {:?}", other),
        }
    }
}
