//! `delimitedValues`: split a field into tokens and check each one.

use std::borrow::Cow;
use std::collections::HashSet;

use crate::error::TokenError;
use crate::rules::conditional;
use crate::types::{DelimitedSpec, Document, NestedConstraint};

/// Split `value` on `delimiter`, keeping token order.
///
/// Padding around the delimiter is optional: `" | "` splits both `"a | b"`
/// and `"a|b"`, and tokens are trimmed. A delimiter made only of whitespace
/// is used verbatim.
pub fn split_tokens<'a>(value: &'a str, delimiter: &str) -> Vec<&'a str> {
    let core = delimiter.trim();
    if core.is_empty() {
        return value.split(delimiter).collect();
    }
    value.split(core).map(str::trim).collect()
}

/// Check every token of `value` against `spec`.
///
/// The `if` block is resolved once for the whole field. All failing tokens are
/// reported, in token order.
pub fn validate(
    value: &str,
    spec: &DelimitedSpec,
    document: &Document,
) -> Result<(), Vec<TokenError>> {
    let mut tokens = split_tokens(value, &spec.delimiter);
    if spec.dedupe {
        let mut seen = HashSet::new();
        tokens.retain(|token| seen.insert(*token));
    }

    let Some(constraint) = effective_constraint(spec, document) else {
        return Ok(());
    };

    let errors: Vec<TokenError> = tokens
        .iter()
        .filter_map(|token| check_token(token, &constraint).err())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The constraint in force for this document, or `None` if tokens are unconstrained.
fn effective_constraint<'a>(
    spec: &'a DelimitedSpec,
    document: &Document,
) -> Option<Cow<'a, NestedConstraint>> {
    let active = spec.conditional.as_ref().filter(|cond| {
        conditional::matches(document, &cond.referenced_field, &cond.allowed_value)
    });

    match (active, &spec.nested) {
        (Some(cond), nested) => {
            tracing::debug!(
                field = %cond.referenced_field,
                "conditional override applies"
            );
            let base = nested.clone().unwrap_or_default();
            Some(Cow::Owned(base.with_overrides(&cond.overrides)))
        }
        (None, Some(nested)) => Some(Cow::Borrowed(nested)),
        (None, None) => None,
    }
}

fn check_token(token: &str, constraint: &NestedConstraint) -> Result<(), TokenError> {
    tracing::trace!(token, "checking token");

    if let Some(format) = &constraint.number_format {
        if !format.matches(token) {
            return Err(TokenError::Format {
                token: token.to_string(),
                format: format.pattern().to_string(),
            });
        }
    }

    if let Some(allowed) = &constraint.allowed {
        if !allowed.iter().any(|a| a == token) {
            return Err(TokenError::NotAllowed {
                token: token.to_string(),
                allowed: allowed.clone(),
            });
        }
    }

    // Bounds only constrain numeric tokens.
    if let Some(number) = numeric_value(token) {
        if let Some(minimum) = constraint.minimum {
            if number < minimum {
                return Err(TokenError::BelowMinimum {
                    token: token.to_string(),
                    minimum,
                });
            }
        }
        if let Some(maximum) = constraint.maximum {
            if number > maximum {
                return Err(TokenError::AboveMaximum {
                    token: token.to_string(),
                    maximum,
                });
            }
        }
    }

    Ok(())
}

/// Numeric value of a token. `NaN` and the infinities count as text.
fn numeric_value(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AllowedValue, ConditionalOverride, ConstraintOverrides, NumberFormat};
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().unwrap().clone()
    }

    fn spec(nested: Option<NestedConstraint>) -> DelimitedSpec {
        DelimitedSpec {
            delimiter: " | ".into(),
            nested,
            conditional: None,
            dedupe: false,
        }
    }

    fn juvenile_cap() -> DelimitedSpec {
        DelimitedSpec {
            conditional: Some(ConditionalOverride {
                referenced_field: "lifestage".into(),
                allowed_value: AllowedValue::One("juvenile".into()),
                overrides: ConstraintOverrides {
                    maximum: Some(20.0),
                    ..Default::default()
                },
            }),
            ..spec(None)
        }
    }

    #[test]
    fn split_is_padding_tolerant_and_ordered() {
        assert_eq!(split_tokens("male|female|male", " | "), ["male", "female", "male"]);
        assert_eq!(split_tokens("male | female", " | "), ["male", "female"]);
        assert_eq!(split_tokens("male", " | "), ["male"]);
        assert_eq!(split_tokens("male;female", " | "), ["male;female"]);
    }

    #[test]
    fn whitespace_delimiter_is_literal() {
        assert_eq!(split_tokens("a b  c", " "), ["a", "b", "", "c"]);
    }

    #[test]
    fn unconstrained_split_always_passes() {
        let document = Document::new();
        assert!(validate("male|female|male", &spec(None), &document).is_ok());
        assert!(validate("male", &spec(None), &document).is_ok());
        assert!(validate("male;female", &spec(None), &document).is_ok());
    }

    #[test]
    fn nested_bounds_and_format() {
        let nested = NestedConstraint {
            minimum: Some(1.0),
            maximum: Some(8.0),
            number_format: NumberFormat::parse(".3f"),
            allowed: None,
        };
        let spec = spec(Some(nested));
        let document = Document::new();

        assert!(validate("1.5 | 2 | 7.125", &spec, &document).is_ok());

        let errors = validate("0.5|9|3.14159", &spec, &document).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], TokenError::BelowMinimum { .. }));
        assert!(matches!(errors[1], TokenError::AboveMaximum { .. }));
        assert!(matches!(errors[2], TokenError::Format { .. }));
    }

    #[test]
    fn allowed_tokens() {
        let nested = NestedConstraint {
            allowed: Some(vec!["male".into(), "female".into()]),
            ..Default::default()
        };
        let document = Document::new();
        assert!(validate("male|female", &spec(Some(nested.clone())), &document).is_ok());

        let errors = validate("male;female", &spec(Some(nested)), &document).unwrap_err();
        assert_eq!(
            errors,
            vec![TokenError::NotAllowed {
                token: "male;female".into(),
                allowed: vec!["male".into(), "female".into()],
            }]
        );
    }

    #[test]
    fn non_numeric_tokens_skip_bounds() {
        let nested = NestedConstraint {
            maximum: Some(20.0),
            ..Default::default()
        };
        assert!(validate("unknown|5", &spec(Some(nested)), &Document::new()).is_ok());
    }

    #[test]
    fn non_finite_tokens_are_not_numbers() {
        assert_eq!(numeric_value("NaN"), None);
        assert_eq!(numeric_value("inf"), None);
        assert_eq!(numeric_value("-infinity"), None);
        assert_eq!(numeric_value("1e3"), Some(1000.0));

        // A NaN token must not slip past the format check either.
        let nested = NestedConstraint {
            minimum: Some(0.0),
            maximum: Some(20.0),
            number_format: NumberFormat::parse(".1f"),
            ..Default::default()
        };
        let errors = validate("NaN|5|inf", &spec(Some(nested)), &Document::new()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, TokenError::Format { .. })));
    }

    #[test]
    fn conditional_cap_applies_when_sibling_matches() {
        let spec = juvenile_cap();
        let juvenile = doc(json!({ "ages": "5|18|19", "lifestage": "juvenile" }));
        assert!(validate("5|18|19", &spec, &juvenile).is_ok());

        let errors = validate("5|32", &spec, &juvenile).unwrap_err();
        assert_eq!(
            errors,
            vec![TokenError::AboveMaximum {
                token: "32".into(),
                maximum: 20.0
            }]
        );
    }

    #[test]
    fn conditional_cap_ignored_otherwise() {
        let spec = juvenile_cap();
        let adult = doc(json!({ "lifestage": "adult" }));
        assert!(validate("5|18|99", &spec, &adult).is_ok());
        assert!(validate("5|18|99", &spec, &Document::new()).is_ok());
    }

    #[test]
    fn conditional_override_keeps_other_nested_bounds() {
        let spec = DelimitedSpec {
            nested: Some(NestedConstraint {
                minimum: Some(1.0),
                maximum: Some(100.0),
                ..Default::default()
            }),
            ..juvenile_cap()
        };
        let juvenile = doc(json!({ "lifestage": "juvenile" }));
        let errors = validate("0|50", &spec, &juvenile).unwrap_err();
        assert_eq!(errors.len(), 2);

        let adult = doc(json!({ "lifestage": "adult" }));
        assert!(validate("50", &spec, &adult).is_ok());
    }

    #[test]
    fn dedupe_is_opt_in() {
        let nested = NestedConstraint {
            allowed: Some(vec!["male".into()]),
            ..Default::default()
        };
        let document = Document::new();

        let errors = validate("female|female", &spec(Some(nested.clone())), &document).unwrap_err();
        assert_eq!(errors.len(), 2);

        let deduped = DelimitedSpec {
            dedupe: true,
            ..spec(Some(nested))
        };
        let errors = validate("female|female", &deduped, &document).unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}
