//! Core types for Darwin Core schema rules.

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::rules::date::strict_shape;

/// A document under validation: field name to raw value.
pub type Document = Map<String, Value>;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Canonical text of a scalar value.
///
/// Strings are borrowed as-is, numbers and booleans are rendered. Returns
/// `None` for null, arrays and objects.
pub fn value_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

/// A compiled custom rule for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleSpec {
    /// Inclusive calendar range.
    DateRange { min: NaiveDate, max: NaiveDate },
    /// Ordered strftime patterns; the first full match wins.
    DateFormat { formats: Vec<DatePattern> },
    DelimitedValues(DelimitedSpec),
    ContentType(ContentKind),
}

impl RuleSpec {
    /// The schema keyword this rule was compiled from.
    pub fn keyword(&self) -> &'static str {
        match self {
            RuleSpec::DateRange { .. } => "daterange",
            RuleSpec::DateFormat { .. } => "dateformat",
            RuleSpec::DelimitedValues(_) => "delimitedValues",
            RuleSpec::ContentType(_) => "type",
        }
    }
}

/// Settings of a `delimitedValues` rule.
#[derive(Debug, Clone, PartialEq)]
pub struct DelimitedSpec {
    pub delimiter: String,
    /// Constraints applied to every token. `None` means any split is accepted.
    pub nested: Option<NestedConstraint>,
    pub conditional: Option<ConditionalOverride>,
    /// Drop repeated tokens (first occurrence kept) before checking them.
    pub dedupe: bool,
}

/// Per-token constraints of a delimited field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NestedConstraint {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub number_format: Option<NumberFormat>,
    pub allowed: Option<Vec<String>>,
}

impl NestedConstraint {
    /// Returns a copy with every set override replacing the matching bound.
    pub fn with_overrides(&self, overrides: &ConstraintOverrides) -> NestedConstraint {
        NestedConstraint {
            minimum: overrides.minimum.or(self.minimum),
            maximum: overrides.maximum.or(self.maximum),
            number_format: self.number_format.clone(),
            allowed: overrides
                .allowed
                .clone()
                .or_else(|| self.allowed.clone()),
        }
    }
}

/// Constraints an `if` block may replace when its predicate holds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConstraintOverrides {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub allowed: Option<Vec<String>>,
}

impl ConstraintOverrides {
    pub fn is_empty(&self) -> bool {
        self.minimum.is_none() && self.maximum.is_none() && self.allowed.is_none()
    }
}

/// An `if` block: overrides that apply when a sibling field holds an allowed value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalOverride {
    pub referenced_field: String,
    pub allowed_value: AllowedValue,
    pub overrides: ConstraintOverrides,
}

/// Value(s) a referenced field must hold for a conditional to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedValue {
    One(String),
    Any(Vec<String>),
}

impl AllowedValue {
    pub fn contains(&self, candidate: &str) -> bool {
        match self {
            AllowedValue::One(v) => v == candidate,
            AllowedValue::Any(values) => values.iter().any(|v| v == candidate),
        }
    }
}

/// A `numberformat` pattern such as `.3f`: a decimal with at most N fraction digits.
#[derive(Debug, Clone)]
pub struct NumberFormat {
    pattern: String,
    fraction_digits: usize,
    matcher: Regex,
}

impl NumberFormat {
    /// Parse a `[%].Nf` pattern.
    ///
    /// Returns `None` when the pattern is outside that grammar (caller should error).
    pub fn parse(pattern: &str) -> Option<Self> {
        let body = pattern.trim().strip_prefix('%').unwrap_or(pattern.trim());
        let digits = body.strip_prefix('.')?.strip_suffix('f')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let fraction_digits: usize = digits.parse().ok()?;
        let source = if fraction_digits == 0 {
            r"^[+-]?\d+\.?$".to_string()
        } else {
            format!(r"^[+-]?(\d+(\.\d{{0,{n}}})?|\.\d{{1,{n}}})$", n = fraction_digits)
        };
        let matcher = Regex::new(&source).ok()?;
        Some(Self {
            pattern: pattern.to_string(),
            fraction_digits,
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn fraction_digits(&self) -> usize {
        self.fraction_digits
    }

    pub fn matches(&self, token: &str) -> bool {
        self.matcher.is_match(token)
    }
}

impl PartialEq for NumberFormat {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

/// A `dateformat` strftime pattern, compiled together with the exact text shape it accepts.
#[derive(Debug, Clone)]
pub struct DatePattern {
    pattern: String,
    shape: Regex,
}

impl DatePattern {
    /// Compile a strftime pattern.
    ///
    /// Returns `None` for an empty pattern or one with unknown `%` items (caller should error).
    pub fn parse(pattern: &str) -> Option<Self> {
        let source = strict_shape(pattern)?;
        let shape = Regex::new(&source).ok()?;
        Some(Self {
            pattern: pattern.to_string(),
            shape,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// True if `value` has the digit counts and literals the pattern asks for.
    pub fn fits_shape(&self, value: &str) -> bool {
        self.shape.is_match(value)
    }
}

impl PartialEq for DatePattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

/// Content checks selected by `type: json` / `type: uri`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Json,
    Uri,
}

impl ContentKind {
    /// Parse a `type` value.
    ///
    /// Returns `None` for types owned by the base validator (`string`, `integer`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "json" => Some(ContentKind::Json),
            "uri" => Some(ContentKind::Uri),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Json => "json",
            ContentKind::Uri => "uri",
        }
    }
}

/// Options for document validation.
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// When true, document fields missing from the schema are reported as
    /// unknown. Defaults to false so fields consulted only by `if` blocks pass.
    pub strict: bool,
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set strict mode (reject fields the schema does not declare).
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Result of validating one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    /// Field name to messages, in the order they were recorded.
    pub errors: BTreeMap<String, Vec<String>>,
}

impl Default for ValidationOutcome {
    fn default() -> Self {
        Self {
            valid: true,
            errors: BTreeMap::new(),
        }
    }
}

impl ValidationOutcome {
    /// Record a failure for `field`.
    pub fn record(&mut self, field: &str, message: impl Into<String>) {
        self.valid = false;
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Messages recorded for `field`, empty when it passed.
    pub fn field_errors(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }
}
