//! Schema compilation - turns loosely-typed rule mappings into `RuleSpec`s.
//!
//! All malformed rules are reported here, before any document is validated.

use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::rules::date::parse_flexible_date;
use crate::types::{
    json_type_name, value_text, AllowedValue, ConditionalOverride, ConstraintOverrides,
    ContentKind, DatePattern, DelimitedSpec, NestedConstraint, NumberFormat, RuleSpec,
};

/// Compiled rules of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRules {
    pub name: String,
    /// Custom rules, in the order they were declared.
    pub rules: Vec<RuleSpec>,
    /// Keywords left to the base validator (`required`, `type: string`, ...).
    pub base_keywords: Map<String, Value>,
}

/// An immutable, field-keyed set of compiled rules.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Vec<FieldRules>,
}

impl Schema {
    /// Compile a schema from a mapping of field names to rule mappings.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found, in field order.
    pub fn from_value(schema: &Value) -> Result<Self, ConfigError> {
        let Value::Object(map) = schema else {
            return Err(ConfigError::SchemaNotMapping {
                actual: json_type_name(schema).to_string(),
            });
        };

        let fields = map
            .iter()
            .map(|(name, rules)| compile_field(name, rules))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(fields = fields.len(), "schema compiled");
        Ok(Self { fields })
    }

    /// Look up the rules of `name`.
    pub fn get(&self, name: &str) -> Option<&FieldRules> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldRules> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Compile the rule mapping of a single field.
///
/// # Errors
///
/// Returns `ConfigError` if any recognised keyword is malformed.
pub fn compile_field(name: &str, rules: &Value) -> Result<FieldRules, ConfigError> {
    let Value::Object(map) = rules else {
        return Err(ConfigError::RulesNotMapping {
            field: name.to_string(),
            actual: json_type_name(rules).to_string(),
        });
    };

    let mut compiled = FieldRules {
        name: name.to_string(),
        rules: Vec::new(),
        base_keywords: Map::new(),
    };

    for (keyword, value) in map {
        let rule = match keyword.as_str() {
            "daterange" => Some(compile_date_range(name, value)?),
            "dateformat" => Some(compile_date_format(name, value)?),
            "delimitedValues" => Some(compile_delimited(name, value)?),
            // Only json/uri are ours; other types belong to the base validator.
            "type" => value
                .as_str()
                .and_then(ContentKind::parse)
                .map(RuleSpec::ContentType),
            _ => None,
        };

        match rule {
            Some(rule) => compiled.rules.push(rule),
            None => {
                compiled.base_keywords.insert(keyword.clone(), value.clone());
            }
        }
    }

    Ok(compiled)
}

fn compile_date_range(field: &str, value: &Value) -> Result<RuleSpec, ConfigError> {
    let bounds = match value.as_array() {
        Some(items) if items.len() == 2 => items,
        _ => return Err(invalid_type(field, "daterange", "a [min, max] pair", value)),
    };

    let parse_bound = |bound: &Value| {
        value_text(bound)
            .and_then(|text| parse_flexible_date(&text))
            .ok_or_else(|| ConfigError::InvalidDateBound {
                field: field.to_string(),
                bound: value_text(bound)
                    .map(|t| t.into_owned())
                    .unwrap_or_else(|| bound.to_string()),
            })
    };

    let min = parse_bound(&bounds[0])?;
    let max = parse_bound(&bounds[1])?;
    if min > max {
        return Err(ConfigError::InvertedDateRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(RuleSpec::DateRange { min, max })
}

fn compile_date_format(field: &str, value: &Value) -> Result<RuleSpec, ConfigError> {
    const EXPECTED: &str = "a pattern or a non-empty list of patterns";

    // A single pattern behaves as a one-element list.
    let sources: Vec<&str> = match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| invalid_type(field, "dateformat", EXPECTED, item))
            })
            .collect::<Result<_, _>>()?,
        _ => return Err(invalid_type(field, "dateformat", EXPECTED, value)),
    };

    let formats = sources
        .into_iter()
        .map(|source| {
            DatePattern::parse(source).ok_or_else(|| ConfigError::InvalidDatePattern {
                field: field.to_string(),
                pattern: source.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RuleSpec::DateFormat { formats })
}

fn compile_delimited(field: &str, value: &Value) -> Result<RuleSpec, ConfigError> {
    let Value::Object(options) = value else {
        return Err(invalid_type(field, "delimitedValues", "a mapping", value));
    };

    let mut delimiter = None;
    let mut nested = NestedConstraint::default();
    let mut conditional = None;
    let mut dedupe = false;

    for (option, setting) in options {
        match option.as_str() {
            "delimiter" => match setting.as_str() {
                Some(d) if !d.is_empty() => delimiter = Some(d.to_string()),
                _ => {
                    return Err(ConfigError::InvalidDelimiter {
                        field: field.to_string(),
                    })
                }
            },
            "minimum" | "min" => nested.minimum = Some(number(field, option, setting)?),
            "maximum" | "max" => nested.maximum = Some(number(field, option, setting)?),
            "numberformat" => {
                let pattern = setting
                    .as_str()
                    .ok_or_else(|| invalid_type(field, option, "a string", setting))?;
                let format =
                    NumberFormat::parse(pattern).ok_or_else(|| ConfigError::InvalidNumberFormat {
                        field: field.to_string(),
                        pattern: pattern.to_string(),
                    })?;
                nested.number_format = Some(format);
            }
            "allowed" => nested.allowed = Some(string_list(field, option, setting)?),
            "listvalues" => {
                dedupe = setting
                    .as_bool()
                    .ok_or_else(|| invalid_type(field, option, "a boolean", setting))?;
            }
            "if" => conditional = Some(compile_conditional(field, setting)?),
            _ => {
                return Err(ConfigError::UnknownOption {
                    field: field.to_string(),
                    keyword: "delimitedValues".to_string(),
                    option: option.clone(),
                })
            }
        }
    }

    let delimiter = delimiter.ok_or_else(|| ConfigError::InvalidDelimiter {
        field: field.to_string(),
    })?;
    check_bounds(field, nested.minimum, nested.maximum)?;

    let nested = (nested != NestedConstraint::default()).then_some(nested);
    Ok(RuleSpec::DelimitedValues(DelimitedSpec {
        delimiter,
        nested,
        conditional,
        dedupe,
    }))
}

/// Compile an `if` block:
///
/// ```yaml
/// if:
///   lifestage:
///     allowed: juvenile
///   max: 20
/// ```
///
/// Exactly one key names the referenced field; the others are overrides.
fn compile_conditional(field: &str, value: &Value) -> Result<ConditionalOverride, ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidConditional {
        field: field.to_string(),
        message: message.to_string(),
    };

    let Value::Object(block) = value else {
        return Err(invalid("expected a mapping"));
    };

    let mut overrides = ConstraintOverrides::default();
    let mut predicate: Option<(String, AllowedValue)> = None;

    for (key, setting) in block {
        match key.as_str() {
            "minimum" | "min" => overrides.minimum = Some(number(field, key, setting)?),
            "maximum" | "max" => overrides.maximum = Some(number(field, key, setting)?),
            "allowed" => overrides.allowed = Some(string_list(field, key, setting)?),
            referenced => {
                if predicate.is_some() {
                    return Err(invalid("more than one referenced field"));
                }
                let allowed = setting
                    .get("allowed")
                    .ok_or_else(|| invalid("referenced field needs an 'allowed' value"))?;
                let allowed = match allowed {
                    Value::Array(_) => AllowedValue::Any(string_list(field, key, allowed)?),
                    other => AllowedValue::One(
                        value_text(other)
                            .map(|t| t.into_owned())
                            .ok_or_else(|| invalid("'allowed' must be a scalar or a list"))?,
                    ),
                };
                predicate = Some((referenced.to_string(), allowed));
            }
        }
    }

    let (referenced_field, allowed_value) =
        predicate.ok_or_else(|| invalid("no referenced field"))?;
    if overrides.is_empty() {
        return Err(invalid("no constraint to override"));
    }
    check_bounds(field, overrides.minimum, overrides.maximum)?;

    Ok(ConditionalOverride {
        referenced_field,
        allowed_value,
        overrides,
    })
}

fn number(field: &str, keyword: &str, value: &Value) -> Result<f64, ConfigError> {
    value
        .as_f64()
        .ok_or_else(|| invalid_type(field, keyword, "a number", value))
}

/// A scalar or a list of scalars, rendered as text.
fn string_list(field: &str, keyword: &str, value: &Value) -> Result<Vec<String>, ConfigError> {
    const EXPECTED: &str = "a value or a list of values";
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                value_text(item)
                    .map(|t| t.into_owned())
                    .ok_or_else(|| invalid_type(field, keyword, EXPECTED, item))
            })
            .collect(),
        other => value_text(other)
            .map(|t| vec![t.into_owned()])
            .ok_or_else(|| invalid_type(field, keyword, EXPECTED, other)),
    }
}

fn check_bounds(field: &str, minimum: Option<f64>, maximum: Option<f64>) -> Result<(), ConfigError> {
    match (minimum, maximum) {
        (Some(minimum), Some(maximum)) if minimum > maximum => Err(ConfigError::InvertedBounds {
            field: field.to_string(),
            minimum,
            maximum,
        }),
        _ => Ok(()),
    }
}

fn invalid_type(field: &str, keyword: &str, expected: &str, actual: &Value) -> ConfigError {
    ConfigError::InvalidKeywordType {
        field: field.to_string(),
        keyword: keyword.to_string(),
        expected: expected.to_string(),
        actual: json_type_name(actual).to_string(),
    }
}
