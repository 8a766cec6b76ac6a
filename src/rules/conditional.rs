//! Sibling-field predicates for `if` blocks.

use crate::types::{value_text, AllowedValue, Document};

/// Returns true if `referenced_field` is present in `document` and its value
/// is (one of) `allowed`.
///
/// The value is compared exactly as written. A missing field, or one holding
/// a non-scalar value, never matches.
pub fn matches(document: &Document, referenced_field: &str, allowed: &AllowedValue) -> bool {
    let Some(value) = document.get(referenced_field) else {
        tracing::debug!(field = referenced_field, "conditional field missing");
        return false;
    };

    match value_text(value) {
        Some(text) => allowed.contains(&text),
        None => false,
    }
}
