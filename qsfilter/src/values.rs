//! Typed values on both sides of a filter: the coerced filter value and the
//! attribute value read from an item.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::filters::coercion::parse_datetime;

/// Value of a resolved filter after coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Number(f64),
    DateTime(DateTime<Utc>),
    Text(String),
}

impl FilterValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            FilterValue::DateTime(at) => Some(*at),
            _ => None,
        }
    }

    /// Textual form used when rendering store queries.
    pub fn to_query_string(&self) -> String {
        match self {
            FilterValue::Bool(flag) => flag.to_string(),
            FilterValue::Number(number) => number.to_string(),
            FilterValue::DateTime(at) => at.to_rfc3339(),
            FilterValue::Text(text) => text.clone(),
        }
    }
}

/// Attribute value read from an item during in-memory filtering.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime<Utc>),
    Text(String),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Order this attribute value against a filter value.
    ///
    /// Returns `None` when the two sides are not comparable (missing attribute,
    /// mismatched types, NaN). Text attributes are parsed on the fly when
    /// compared against a date.
    pub fn compare(&self, other: &FilterValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Bool(a), FilterValue::Bool(b)) => Some(a.cmp(b)),
            (FieldValue::Number(a), FilterValue::Number(b)) => a.partial_cmp(b),
            (FieldValue::DateTime(a), FilterValue::DateTime(b)) => Some(a.cmp(b)),
            (FieldValue::Text(a), FilterValue::DateTime(b)) => parse_datetime(a).map(|parsed| parsed.at.cmp(b)),
            (FieldValue::Text(a), FilterValue::Text(b)) => Some(a.as_str().cmp(b.as_str())),
            _ => None,
        }
    }

    /// Order two attribute values, used when sorting collections.
    ///
    /// Nulls sort first; values of different types compare by type.
    pub fn sort_cmp(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => a.cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::List(a), FieldValue::List(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x.sort_cmp(y))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Bool(_) => 1,
            FieldValue::Number(_) => 2,
            FieldValue::DateTime(_) => 3,
            FieldValue::Text(_) => 4,
            FieldValue::List(_) => 5,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Plain-text rendering for tables.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(flag) => flag.to_string(),
            FieldValue::Number(number) => number.to_string(),
            FieldValue::DateTime(at) => at.to_rfc3339(),
            FieldValue::Text(text) => text.clone(),
            FieldValue::List(items) => items.iter().map(FieldValue::display).collect::<Vec<_>>().join(", "),
        }
    }
}

impl From<&JsonValue> for FieldValue {
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null | JsonValue::Object(_) => FieldValue::Null,
            JsonValue::Bool(flag) => FieldValue::Bool(*flag),
            JsonValue::Number(number) => number.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Null),
            JsonValue::String(text) => FieldValue::Text(text.clone()),
            JsonValue::Array(items) => FieldValue::List(items.iter().map(FieldValue::from).collect()),
        }
    }
}

/// Attribute access used by the in-memory materializer.
///
/// `#[derive(FilterSchema)]` implements this for structs; it is implemented
/// here for JSON documents.
pub trait FilterTarget {
    /// Value of the named attribute, or `None` when the item has no such attribute.
    fn field_value(&self, attribute: &str) -> Option<FieldValue>;
}

impl FilterTarget for JsonValue {
    /// Dotted attribute names walk nested objects (`owner.name`).
    fn field_value(&self, attribute: &str) -> Option<FieldValue> {
        let mut current = self;
        for segment in attribute.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(FieldValue::from(current))
    }
}

/// Conversion from a struct field into a [`FieldValue`].
pub trait IntoFieldValue {
    fn to_field_value(&self) -> FieldValue;
}

macro_rules! numeric_field_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoFieldValue for $ty {
                #[inline]
                fn to_field_value(&self) -> FieldValue {
                    FieldValue::Number(*self as f64)
                }
            }
        )*
    };
}

numeric_field_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl IntoFieldValue for bool {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }
}

impl IntoFieldValue for String {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Text(self.clone())
    }
}

impl IntoFieldValue for str {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Text(self.to_string())
    }
}

impl IntoFieldValue for &str {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Text((*self).to_string())
    }
}

impl IntoFieldValue for DateTime<Utc> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::DateTime(*self)
    }
}

impl IntoFieldValue for DateTime<FixedOffset> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::DateTime(self.with_timezone(&Utc))
    }
}

impl IntoFieldValue for NaiveDateTime {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::DateTime(self.and_utc())
    }
}

impl IntoFieldValue for NaiveDate {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::DateTime(self.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

impl<T: IntoFieldValue> IntoFieldValue for Option<T> {
    fn to_field_value(&self) -> FieldValue {
        self.as_ref().map(T::to_field_value).unwrap_or(FieldValue::Null)
    }
}

impl<T: IntoFieldValue> IntoFieldValue for Vec<T> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::List(self.iter().map(T::to_field_value).collect())
    }
}

impl IntoFieldValue for FieldValue {
    fn to_field_value(&self) -> FieldValue {
        self.clone()
    }
}
