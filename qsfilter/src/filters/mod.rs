//! Parsing of `filter[<field>][<op>]=<value>` query parameters.
//!
//! The [`FilterParser`] walks the request's query parameters, resolves each
//! filter field against the [`Schema`], validates the operator for the field's
//! kind and coerces the raw value. The output is a flat list of
//! [`ResolvedFilter`]s (implicitly ANDed) ready for either materializer.

pub mod coercion;
pub mod operators;
pub mod ordering;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub use coercion::{FilterClause, ParsedInstant, parse_datetime};
pub use operators::FilterOperator;
pub use ordering::{Ordering, SortOrder, SortTerm};

use crate::config::FilterConfig;
use crate::errors::{FilterError, FilterResult};
use crate::schema::{FieldDescriptor, FieldKind, Schema};
use crate::values::FilterValue;

static QUERY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^filter\[(?P<field>\w+)\](\[(?P<op>\w+)\])?$").expect("filter key pattern is valid")
});

/// Query-string parameters of one request, in arrival order.
///
/// Repeated keys are kept; every occurrence of a filter key becomes its own
/// filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw (form-urlencoded) query string. A leading `?` is ignored.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        url::form_urlencoded::parse(query.as_bytes()).into_owned().collect()
    }

    #[inline]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Last value supplied for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    /// Filter specifications among the parameters; other keys are skipped.
    pub fn filter_specs(&self) -> impl Iterator<Item = FilterSpec> + '_ {
        self.iter().filter_map(|(key, value)| FilterSpec::from_param(key, value))
    }

    pub fn has_filters(&self) -> bool {
        self.filter_specs().next().is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect(),
        }
    }
}

/// One filter parameter as written by the client, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub field: String,
    pub operator: Option<String>,
    pub raw_value: String,
}

impl FilterSpec {
    /// Recognize `filter[<field>]` and `filter[<field>][<op>]` keys.
    pub fn from_param(key: &str, value: &str) -> Option<Self> {
        let captures = QUERY_PATTERN.captures(key)?;
        let field = captures.name("field")?.as_str().trim().to_string();
        let operator = captures.name("op").map(|op| op.as_str().to_string());
        Some(Self {
            field,
            operator,
            raw_value: value.to_string(),
        })
    }
}

/// A validated, type-coerced filter ready for execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFilter {
    /// Field name as declared on the schema.
    pub field: String,
    /// Attribute the filter applies to (the field's source, or its name).
    pub target: String,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub computed: bool,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

/// Turns query parameters into [`ResolvedFilter`]s for one schema.
#[derive(Debug, Clone, Copy)]
pub struct FilterParser<'a> {
    schema: &'a Schema,
    config: &'a FilterConfig,
}

impl<'a> FilterParser<'a> {
    pub fn new(schema: &'a Schema, config: &'a FilterConfig) -> Self {
        Self { schema, config }
    }

    #[inline]
    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    #[inline]
    pub fn config(&self) -> &'a FilterConfig {
        self.config
    }

    /// Look up a filter field.
    ///
    /// Unknown fields fail with [`FilterError::InvalidFilter`]; declared but not
    /// filterable fields fail with [`FilterError::InvalidFilterField`].
    pub fn field_or_error(&self, name: &str) -> FilterResult<&'a FieldDescriptor> {
        let field = self.schema.field(name).ok_or_else(|| FilterError::InvalidFilter {
            field: name.to_string(),
        })?;
        if !field.filterable {
            return Err(FilterError::InvalidFilterField {
                attribute: name.to_string(),
            });
        }
        Ok(field)
    }

    /// Resolve the operator token (or the kind's default) and check it fits the field.
    pub fn validate_operator(&self, field: &FieldDescriptor, token: Option<&str>) -> FilterResult<FilterOperator> {
        let operator = match token {
            Some(token) => token.parse::<FilterOperator>()?,
            None => field.kind.default_operator(),
        };
        if operator.is_comparison() && !field.kind.is_comparable() {
            return Err(FilterError::InvalidFilterComparisonType {
                attribute: field.name.clone(),
            });
        }
        if operator.is_match() && !field.kind.is_matchable() {
            return Err(FilterError::InvalidFilterMatchType {
                attribute: field.name.clone(),
            });
        }
        Ok(operator)
    }

    /// Validate and coerce one specification.
    pub fn resolve(&self, spec: &FilterSpec) -> FilterResult<Vec<ResolvedFilter>> {
        let field = self.field_or_error(&spec.field)?;
        let operator = self.validate_operator(field, spec.operator.as_deref())?;
        let clauses = coercion::expand_clauses(field.kind, operator, &spec.raw_value, self.config)?;
        Ok(clauses
            .into_iter()
            .map(|clause| ResolvedFilter {
                field: field.name.clone(),
                target: field.target().to_string(),
                kind: field.kind,
                computed: field.is_computed(),
                operator: clause.operator,
                value: clause.value,
            })
            .collect())
    }

    /// Resolve every filter parameter in `params`. The first invalid one aborts.
    pub fn parse_query_params(&self, params: &QueryParams) -> FilterResult<Vec<ResolvedFilter>> {
        let mut resolved = Vec::new();
        for spec in params.filter_specs() {
            let filters = self.resolve(&spec)?;
            log::debug!(
                "resolved filter[{}][{}] into {} clause(s)",
                spec.field,
                spec.operator.as_deref().unwrap_or("default"),
                filters.len()
            );
            resolved.extend(filters);
        }
        Ok(resolved)
    }

    /// Parse the ordering parameter; see [`Ordering::parse`].
    pub fn parse_ordering(&self, params: &QueryParams) -> Ordering {
        params
            .get(&self.config.filters.ordering_param)
            .map(|raw| Ordering::parse(raw, self.schema))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_filter_keys() {
        assert_eq!(
            FilterSpec::from_param("filter[title]", "x"),
            Some(FilterSpec {
                field: "title".to_string(),
                operator: None,
                raw_value: "x".to_string(),
            })
        );
        assert_eq!(
            FilterSpec::from_param("filter[date_created][gte]", "2020-01-01").and_then(|s| s.operator),
            Some("gte".to_string())
        );
        for key in ["page", "filter", "filter[]", "filter[a-b]", "filter[title][eq]x", "xfilter[title]"] {
            assert_eq!(FilterSpec::from_param(key, "v"), None, "{key}");
        }
    }

    #[test]
    fn query_string_is_decoded() {
        let params = QueryParams::from_query_string("?filter%5Btitle%5D=open+science&page=2&page=3");
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("filter[title]"), Some("open science"));
        assert_eq!(params.get("page"), Some("3"));
        assert!(QueryParams::from_query_string("").is_empty());
    }

    #[test]
    fn operator_validation_uses_field_kind() {
        let schema = Schema::builder()
            .filterable("title", FieldKind::Text)
            .filterable("downloads", FieldKind::Numeric)
            .build();
        let config = FilterConfig::default();
        let parser = FilterParser::new(&schema, &config);
        let title = schema.field("title").unwrap();
        let downloads = schema.field("downloads").unwrap();

        assert_eq!(parser.validate_operator(title, None), Ok(FilterOperator::Icontains));
        assert_eq!(parser.validate_operator(downloads, None), Ok(FilterOperator::Eq));
        assert_eq!(parser.validate_operator(downloads, Some("lte")), Ok(FilterOperator::Lte));
        assert!(matches!(
            parser.validate_operator(title, Some("gt")),
            Err(FilterError::InvalidFilterComparisonType { .. })
        ));
        assert!(matches!(
            parser.validate_operator(downloads, Some("contains")),
            Err(FilterError::InvalidFilterMatchType { .. })
        ));
        assert!(matches!(
            parser.validate_operator(downloads, Some("between")),
            Err(FilterError::InvalidFilterOperator { .. })
        ));
    }
}
