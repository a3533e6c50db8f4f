//! Conversion of raw query-string values into typed filter values.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::config::FilterConfig;
use crate::errors::{FilterError, FilterResult};
use crate::filters::FilterOperator;
use crate::schema::FieldKind;
use crate::values::FilterValue;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%dT%H:%M%:z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
];

/// A parsed instant plus whether the input spelled out a time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedInstant {
    pub at: DateTime<Utc>,
    pub has_time: bool,
}

/// General-purpose date/time parser.
///
/// Accepts RFC 3339, ISO 8601 date-times (with or without seconds, fraction and
/// offset), space-separated date-times and a handful of plain date spellings.
/// Values without an offset are taken as UTC.
pub fn parse_datetime(raw: &str) -> Option<ParsedInstant> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(ParsedInstant {
            at: at.with_timezone(&Utc),
            has_time: true,
        });
    }

    for format in OFFSET_FORMATS {
        if let Ok(at) = DateTime::parse_from_str(value, format) {
            return Some(ParsedInstant {
                at: at.with_timezone(&Utc),
                has_time: true,
            });
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ParsedInstant {
                at: at.and_utc(),
                has_time: true,
            });
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(ParsedInstant {
                at: date.and_time(NaiveTime::MIN).and_utc(),
                has_time: false,
            });
        }
    }

    None
}

/// One operator/value pair produced for a single filter parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub operator: FilterOperator,
    pub value: FilterValue,
}

/// Coerce a raw value into the type expected by `kind`.
pub fn coerce_value(kind: FieldKind, raw: &str, config: &FilterConfig) -> FilterResult<FilterValue> {
    match kind {
        FieldKind::Boolean => {
            if config.is_truthy(raw) {
                Ok(FilterValue::Bool(true))
            } else if config.is_falsy(raw) {
                Ok(FilterValue::Bool(false))
            } else {
                Err(invalid_value(raw, "bool"))
            }
        }
        FieldKind::Temporal => parse_datetime(raw)
            .map(|parsed| FilterValue::DateTime(parsed.at))
            .ok_or_else(|| invalid_value(raw, "date")),
        FieldKind::Numeric => raw
            .trim()
            .parse::<f64>()
            .map(FilterValue::Number)
            .map_err(|_| invalid_value(raw, "number")),
        FieldKind::Text | FieldKind::List => Ok(FilterValue::Text(raw.trim().to_string())),
    }
}

/// Turn one parameter into its clauses.
///
/// A date-only equality filter on a temporal field matches the whole calendar
/// day: it always becomes `gte` start-of-day plus `lt` start-of-next-day. Every
/// other combination yields exactly one clause.
pub fn expand_clauses(
    kind: FieldKind,
    operator: FilterOperator,
    raw: &str,
    config: &FilterConfig,
) -> FilterResult<Vec<FilterClause>> {
    if kind == FieldKind::Temporal {
        let parsed = parse_datetime(raw).ok_or_else(|| invalid_value(raw, "date"))?;
        if operator == FilterOperator::Eq && !parsed.has_time {
            let start = parsed.at;
            let stop = start
                .checked_add_signed(Duration::days(1))
                .ok_or_else(|| invalid_value(raw, "date"))?;
            return Ok(vec![
                FilterClause {
                    operator: FilterOperator::Gte,
                    value: FilterValue::DateTime(start),
                },
                FilterClause {
                    operator: FilterOperator::Lt,
                    value: FilterValue::DateTime(stop),
                },
            ]);
        }
        return Ok(vec![FilterClause {
            operator,
            value: FilterValue::DateTime(parsed.at),
        }]);
    }

    Ok(vec![FilterClause {
        operator,
        value: coerce_value(kind, raw, config)?,
    }])
}

fn invalid_value(raw: &str, field_type: &'static str) -> FilterError {
    FilterError::InvalidFilterValue {
        value: raw.to_string(),
        field_type,
    }
}
