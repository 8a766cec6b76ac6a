//! Darwin Core Schema Rules
//!
//! Custom validation rules for biodiversity occurrence records, meant to plug
//! into a generic keyed-rule validator.
//!
//! A schema maps field names to rule mappings. The rules handled here are
//! compiled once into typed [`RuleSpec`]s; every other keyword is left to the
//! base validator.
//!
//! # Example
//!
//! ```
//! use dwca_schema::{Schema, Validator};
//! use serde_json::json;
//!
//! let schema = Schema::from_value(&json!({
//!     "age": {
//!         "delimitedValues": {
//!             "delimiter": " | ",
//!             "if": { "lifestage": { "allowed": "juvenile" }, "max": 20 }
//!         }
//!     }
//! }))
//! .unwrap();
//! let validator = Validator::new(schema);
//!
//! let document = json!({ "age": "5|32", "lifestage": "juvenile" });
//! let outcome = validator.validate(document.as_object().unwrap());
//!
//! assert!(!outcome.valid);
//! assert_eq!(outcome.field_errors("age"), ["value \"32\" is above the maximum 20"]);
//! ```
//!
//! # Rules
//!
//! | Keyword | Value | Checks |
//! |---------|-------|--------|
//! | `dateformat` | pattern or list of patterns | full match against the first fitting strftime pattern |
//! | `daterange` | `[min, max]` | date (any common layout) within the inclusive range |
//! | `delimitedValues` | mapping | each token within `minimum`/`maximum`, `numberformat`, `allowed` |
//! | `type` | `json` or `uri` | well-formed JSON text, or `scheme://` absolute URI |
//!
//! # Conditional overrides
//!
//! A `delimitedValues` rule may carry an `if` block naming one sibling field
//! and the value(s) it must hold. When it holds, the block's `minimum`,
//! `maximum` and `allowed` replace the rule's own for that document only:
//!
//! ```yaml
//! age:
//!   delimitedValues:
//!     delimiter: " | "
//!     if:
//!       lifestage:
//!         allowed: juvenile
//!       max: 20
//! ```

mod dispatch;
mod error;
mod linter;
mod loader;
mod rules;
mod schema;
mod types;
mod validator;

pub use dispatch::{dispatch, evaluate};
pub use error::{
    ConfigError, ContentError, DateError, LoadError, RuleError, TokenError, ValidateError,
};
pub use linter::{lint, lint_file, Diagnostic, FieldReport, FileReport, LintResult, Severity};
pub use loader::{load_document, load_file, load_schema, load_str, SourceFormat};
pub use rules::conditional::matches as conditional_matches;
pub use rules::content::{validate_json, validate_uri};
pub use rules::date::{parse_flexible_date, validate_format, validate_range};
pub use rules::delimited::{split_tokens, validate as validate_delimited};
pub use schema::{compile_field, FieldRules, Schema};
pub use types::{
    AllowedValue, ConditionalOverride, ConstraintOverrides, ContentKind, DatePattern, DelimitedSpec,
    Document, NestedConstraint, NumberFormat, RuleSpec, ValidateOptions, ValidationOutcome,
};
pub use validator::{validate, validate_against_schema, Validator};
