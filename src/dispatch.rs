//! Dispatch of compiled rules to their implementations.

use serde_json::Value;

use crate::error::RuleError;
use crate::rules::{content, date, delimited};
use crate::types::{json_type_name, value_text, ContentKind, Document, RuleSpec, ValidationOutcome};

/// Evaluate one rule against one field value.
///
/// `document` is the whole record, consulted by `if` blocks.
///
/// # Errors
///
/// Returns every failure the rule found; delimited fields may report several.
pub fn evaluate(spec: &RuleSpec, value: &Value, document: &Document) -> Result<(), Vec<RuleError>> {
    // Structured values are already parsed JSON.
    if matches!(spec, RuleSpec::ContentType(ContentKind::Json)) && !value.is_string() {
        return Ok(());
    }

    let Some(text) = value_text(value) else {
        return Err(vec![RuleError::UnexpectedType {
            keyword: spec.keyword(),
            actual: json_type_name(value),
        }]);
    };

    match spec {
        RuleSpec::DateRange { min, max } => {
            date::validate_range(&text, *min, *max).map_err(|e| vec![e.into()])
        }
        RuleSpec::DateFormat { formats } => {
            date::validate_format(&text, formats).map_err(|e| vec![e.into()])
        }
        RuleSpec::DelimitedValues(rule) => delimited::validate(&text, rule, document)
            .map_err(|errors| errors.into_iter().map(RuleError::from).collect()),
        RuleSpec::ContentType(ContentKind::Json) => {
            content::validate_json(&text).map_err(|e| vec![e.into()])
        }
        RuleSpec::ContentType(ContentKind::Uri) => {
            if !value.is_string() {
                return Err(vec![RuleError::UnexpectedType {
                    keyword: spec.keyword(),
                    actual: json_type_name(value),
                }]);
            }
            content::validate_uri(&text).map_err(|e| vec![e.into()])
        }
    }
}

/// Evaluate `spec` for `field` and record any failures in `outcome`.
///
/// Returns true if the field passed this rule.
pub fn dispatch(
    field: &str,
    spec: &RuleSpec,
    value: &Value,
    document: &Document,
    outcome: &mut ValidationOutcome,
) -> bool {
    tracing::debug!(field, rule = spec.keyword(), "dispatching rule");

    match evaluate(spec, value, document) {
        Ok(()) => true,
        Err(errors) => {
            for error in errors {
                outcome.record(field, error.to_string());
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ContentError, DateError};
    use crate::types::{DatePattern, DelimitedSpec};
    use serde_json::json;

    #[test]
    fn json_accepts_structured_values() {
        let spec = RuleSpec::ContentType(ContentKind::Json);
        let document = Document::new();
        assert!(evaluate(&spec, &json!({"top": 3}), &document).is_ok());
        assert!(evaluate(&spec, &json!([1, 2]), &document).is_ok());
        assert!(evaluate(&spec, &json!("{\"top\": 3}"), &document).is_ok());
        assert!(evaluate(&spec, &json!("{\"top\": 3"), &document).is_err());
    }

    #[test]
    fn uri_requires_string() {
        let spec = RuleSpec::ContentType(ContentKind::Uri);
        let errors = evaluate(&spec, &json!(42), &Document::new()).unwrap_err();
        assert_eq!(
            errors,
            vec![RuleError::UnexpectedType {
                keyword: "type",
                actual: "number"
            }]
        );
    }

    #[test]
    fn numeric_dates_use_their_text() {
        let spec = RuleSpec::DateFormat {
            formats: vec![DatePattern::parse("%Y%m%d").unwrap()],
        };
        assert!(evaluate(&spec, &json!(20110101), &Document::new()).is_ok());
    }

    #[test]
    fn object_dates_are_rejected() {
        let spec = RuleSpec::DateFormat {
            formats: vec![DatePattern::parse("%Y").unwrap()],
        };
        assert!(matches!(
            evaluate(&spec, &json!({"year": 1997}), &Document::new())
                .unwrap_err()
                .as_slice(),
            [RuleError::UnexpectedType { .. }]
        ));
    }

    #[test]
    fn dispatch_records_each_failure() {
        let spec = RuleSpec::DelimitedValues(DelimitedSpec {
            delimiter: "|".into(),
            nested: Some(crate::types::NestedConstraint {
                maximum: Some(10.0),
                ..Default::default()
            }),
            conditional: None,
            dedupe: false,
        });
        let mut outcome = ValidationOutcome::default();
        let passed = dispatch("ages", &spec, &json!("11|5|12"), &Document::new(), &mut outcome);

        assert!(!passed);
        assert_eq!(
            outcome.field_errors("ages"),
            [
                "value \"11\" is above the maximum 10",
                "value \"12\" is above the maximum 10"
            ]
        );
    }

    #[test]
    fn dispatch_passing_rule_records_nothing() {
        let spec = RuleSpec::ContentType(ContentKind::Uri);
        let mut outcome = ValidationOutcome::default();
        assert!(dispatch(
            "location",
            &spec,
            &json!("https://example.org/path"),
            &Document::new(),
            &mut outcome
        ));
        assert!(outcome.valid);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn errors_convert_transparently() {
        let err: RuleError = DateError::ParseError {
            value: "x".into(),
        }
        .into();
        assert!(matches!(err, RuleError::Date(_)));
        let err: RuleError = ContentError::UriFormat { value: "x".into() }.into();
        assert!(matches!(err, RuleError::Content(_)));
    }
}
