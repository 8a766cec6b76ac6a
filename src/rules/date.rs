//! `dateformat` and `daterange` checks.

use chrono::format::{parse, Fixed, Item, Numeric, Parsed, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::DateError;
use crate::types::DatePattern;

/// Calendar layouts accepted wherever a date is parsed without a declared format.
const FLEXIBLE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y%m%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y", "%B %d, %Y",
    "%b %d, %Y", "%d %B %Y", "%d %b %Y",
];

const FLEXIBLE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y%m%dT%H%M%S",
];

/// Anchored regex source for the exact text shape `pattern` allows.
///
/// chrono's parser tolerates signs, leading whitespace and short years that a
/// declared pattern should not, so values are matched against this shape
/// before they are parsed. Returns `None` if `pattern` is empty or holds an
/// item chrono does not understand.
pub(crate) fn strict_shape(pattern: &str) -> Option<String> {
    if pattern.is_empty() {
        return None;
    }

    let mut source = String::from("^");
    for item in StrftimeItems::new(pattern) {
        match item {
            Item::Literal(text) | Item::Space(text) => source.push_str(&regex::escape(text)),
            Item::OwnedLiteral(text) | Item::OwnedSpace(text) => {
                source.push_str(&regex::escape(&text))
            }
            Item::Numeric(numeric, _) => source.push_str(numeric_shape(&numeric)),
            Item::Fixed(fixed) => source.push_str(fixed_shape(&fixed)),
            _ => return None,
        }
    }
    source.push('$');
    Some(source)
}

fn numeric_shape(numeric: &Numeric) -> &'static str {
    match numeric {
        Numeric::Year | Numeric::IsoYear => r"\d{4}",
        Numeric::YearDiv100
        | Numeric::YearMod100
        | Numeric::IsoYearDiv100
        | Numeric::IsoYearMod100 => r"\d{2}",
        Numeric::Ordinal => r"\d{1,3}",
        Numeric::NumDaysFromSun | Numeric::WeekdayFromMon => r"\d",
        Numeric::Nanosecond => r"\d{1,9}",
        Numeric::Timestamp => r"-?\d+",
        // month, day, week, hour, minute, second
        _ => r"\d{1,2}",
    }
}

fn fixed_shape(fixed: &Fixed) -> &'static str {
    match fixed {
        Fixed::ShortMonthName
        | Fixed::LongMonthName
        | Fixed::ShortWeekdayName
        | Fixed::LongWeekdayName => "[A-Za-z]+",
        Fixed::LowerAmPm | Fixed::UpperAmPm => "(?i:am|pm)",
        Fixed::Nanosecond => r"(\.\d{1,9})?",
        Fixed::Nanosecond3 => r"\.\d{3}",
        Fixed::Nanosecond6 => r"\.\d{6}",
        Fixed::Nanosecond9 => r"\.\d{9}",
        Fixed::TimezoneOffset
        | Fixed::TimezoneOffsetColon
        | Fixed::TimezoneOffsetZ
        | Fixed::TimezoneOffsetColonZ => r"(Z|[+-]\d{2}:?\d{2})",
        _ => r"\S+",
    }
}

/// Parse a date written in any common calendar representation.
///
/// Tries compact (`YYYYMMDD`), hyphenated (`YYYY-MM-DD`), slashed and
/// spelled-out month forms, then date-times, where the time part is dropped.
pub fn parse_flexible_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    FLEXIBLE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            FLEXIBLE_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Returns true if the whole of `value` matches `pattern`.
///
/// Patterns may describe partial dates (`%Y-%m`, `%Y`); whatever calendar
/// fields are present must still form a real date.
pub fn matches_pattern(value: &str, pattern: &DatePattern) -> bool {
    if !pattern.fits_shape(value) {
        return false;
    }
    let mut parsed = Parsed::new();
    if parse(&mut parsed, value, StrftimeItems::new(pattern.as_str())).is_err() {
        return false;
    }
    if parsed.day().is_some() || parsed.ordinal().is_some() {
        return parsed.to_naive_date().is_ok();
    }
    true
}

/// Check `value` against an ordered list of patterns; the first match wins.
pub fn validate_format(value: &str, formats: &[DatePattern]) -> Result<(), DateError> {
    match formats.iter().find(|fmt| matches_pattern(value, fmt)) {
        Some(fmt) => {
            tracing::trace!(value, format = fmt.as_str(), "date format matched");
            Ok(())
        }
        None => Err(DateError::FormatMismatch {
            value: value.to_string(),
            attempted: formats.iter().map(|f| f.as_str().to_string()).collect(),
        }),
    }
}

/// Check that `value` parses as a date inside `[min, max]`.
pub fn validate_range(value: &str, min: NaiveDate, max: NaiveDate) -> Result<(), DateError> {
    let actual = parse_flexible_date(value).ok_or_else(|| DateError::ParseError {
        value: value.to_string(),
    })?;

    if actual < min || actual > max {
        return Err(DateError::RangeError { min, max, actual });
    }
    Ok(())
}
