//! `type: json` and `type: uri` content checks.

use serde_json::Value;

use crate::error::ContentError;

/// Check that `value` is one complete JSON document.
pub fn validate_json(value: &str) -> Result<(), ContentError> {
    serde_json::from_str::<Value>(value)
        .map(|_| ())
        .map_err(|e| ContentError::JsonParse {
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        })
}

/// Check that `value` is an absolute URI: `scheme://` plus a non-empty remainder.
///
/// The scheme follows RFC 3986 (a letter, then letters, digits, `+`, `-`, `.`).
/// Nothing is fetched.
pub fn validate_uri(value: &str) -> Result<(), ContentError> {
    let invalid = || ContentError::UriFormat {
        value: value.to_string(),
    };

    let (scheme, rest) = value.split_once("://").ok_or_else(invalid)?;
    if !is_scheme(scheme) || rest.is_empty() {
        return Err(invalid());
    }
    Ok(())
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_object() {
        assert!(validate_json(r#"{"top": 3, "centre": 5, "bottom": 6}"#).is_ok());
    }

    #[test]
    fn json_with_surrounding_whitespace() {
        assert!(validate_json("\n   {\"top\": 3}\n   ").is_ok());
    }

    #[test]
    fn json_scalars_and_arrays() {
        assert!(validate_json("[1, 2, 3]").is_ok());
        assert!(validate_json("42").is_ok());
        assert!(validate_json("\"text\"").is_ok());
    }

    #[test]
    fn json_truncated_object() {
        let err = validate_json(r#"{"top": 3, "centre": 5, "bottom": 6"#).unwrap_err();
        assert!(matches!(err, ContentError::JsonParse { line: 1, .. }));
    }

    #[test]
    fn json_trailing_content() {
        assert!(validate_json(r#"{"top": 3} extra"#).is_err());
        assert!(validate_json("").is_err());
    }

    #[test]
    fn uri_valid() {
        assert!(validate_uri("https://github.com/LifeWatchINBO/dwca-validator").is_ok());
        assert!(validate_uri("ftp://example.org").is_ok());
        assert!(validate_uri("urn+x://a").is_ok());
    }

    #[test]
    fn uri_missing_separator() {
        assert_eq!(
            validate_uri("https/github.com/LifeWatchINBO/dwca-validator"),
            Err(ContentError::UriFormat {
                value: "https/github.com/LifeWatchINBO/dwca-validator".into()
            })
        );
    }

    #[test]
    fn uri_empty_parts() {
        assert!(validate_uri("https://").is_err());
        assert!(validate_uri("://example.org").is_err());
        assert!(validate_uri("1http://example.org").is_err());
    }
}
