//! In-memory materializer: filters a caller-supplied collection.
//!
//! Each resolved filter keeps the items whose attribute passes it and the
//! results are intersected as sets. Items that compare equal collapse into
//! one; the survivors keep the order in which they first appear in the
//! default collection.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::errors::FilterResult;
use crate::filters::{FilterOperator, FilterParser, QueryParams, ResolvedFilter};
use crate::schema::FieldKind;
use crate::values::{FieldValue, FilterTarget, FilterValue};

type Accessor<T> = Box<dyn Fn(&T) -> Option<FieldValue> + Send + Sync>;

pub struct ListFilter<'a, T> {
    parser: FilterParser<'a>,
    default: Vec<T>,
    accessors: HashMap<String, Accessor<T>>,
}

impl<T> fmt::Debug for ListFilter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListFilter")
            .field("parser", &self.parser)
            .field("default_len", &self.default.len())
            .field("accessors", &self.accessors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<'a, T> ListFilter<'a, T>
where
    T: FilterTarget + Clone + PartialEq,
{
    pub fn new(parser: FilterParser<'a>, default: Vec<T>) -> Self {
        Self {
            parser,
            default,
            accessors: HashMap::new(),
        }
    }

    /// Register the value provider for a computed field.
    pub fn with_accessor<F>(mut self, field: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T) -> Option<FieldValue> + Send + Sync + 'static,
    {
        self.accessors.insert(field.into(), Box::new(accessor));
        self
    }

    pub fn default_collection(&self) -> &[T] {
        &self.default
    }

    /// Filter the default collection by every filter parameter in `params`.
    ///
    /// The result is deduplicated even when no filter parameter is present.
    pub fn param_queryset(&self, params: &QueryParams) -> FilterResult<Vec<T>> {
        let filters = self.parser.parse_query_params(params)?;
        let mut items = unique(&self.default);
        for filter in &filters {
            items.retain(|item| self.matches(item, filter));
        }
        Ok(items)
    }

    /// Filtered and ordered collection for a request.
    ///
    /// A request without any query parameter gets the default collection as is.
    pub fn queryset_from_request(&self, params: &QueryParams) -> FilterResult<Vec<T>> {
        if params.is_empty() {
            return Ok(self.default.clone());
        }
        let mut items = self.param_queryset(params)?;
        self.parser.parse_ordering(params).sort(&mut items);
        Ok(items)
    }

    /// Whether `item` passes one resolved filter.
    pub fn matches(&self, item: &T, filter: &ResolvedFilter) -> bool {
        let actual = if filter.computed {
            match self.accessors.get(&filter.field) {
                Some(accessor) => accessor(item),
                None => {
                    log::warn!("no accessor registered for computed field '{}'", filter.field);
                    return false;
                }
            }
        } else {
            item.field_value(&filter.target)
        };

        match actual {
            Some(actual) => value_matches(filter.kind, filter.operator, &filter.value, &actual),
            None => false,
        }
    }
}

/// First occurrence wins. Quadratic in the collection size, since items only
/// offer `PartialEq`.
fn unique<T: Clone + PartialEq>(items: &[T]) -> Vec<T> {
    let mut seen: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !seen.contains(item) {
            seen.push(item.clone());
        }
    }
    seen
}

fn value_matches(kind: FieldKind, operator: FilterOperator, expected: &FilterValue, actual: &FieldValue) -> bool {
    match kind {
        // text filters always match on case-insensitive containment
        FieldKind::Text => match (actual.as_text(), expected.as_text()) {
            (Some(haystack), Some(needle)) => haystack.to_lowercase().contains(&needle.to_lowercase()),
            _ => false,
        },
        FieldKind::List => {
            let Some(needle) = expected.as_text() else {
                return false;
            };
            let FieldValue::List(elements) = actual else {
                return false;
            };
            elements.iter().any(|element| {
                let element = element.display();
                match operator {
                    FilterOperator::Icontains => element.to_lowercase() == needle.to_lowercase(),
                    _ => element == needle,
                }
            })
        }
        FieldKind::Boolean | FieldKind::Numeric | FieldKind::Temporal => {
            let Some(ordering) = actual.compare(expected) else {
                return false;
            };
            match operator {
                FilterOperator::Eq => ordering == Ordering::Equal,
                FilterOperator::Lt => ordering == Ordering::Less,
                FilterOperator::Lte => ordering != Ordering::Greater,
                FilterOperator::Gt => ordering == Ordering::Greater,
                FilterOperator::Gte => ordering != Ordering::Less,
                FilterOperator::Contains | FilterOperator::Icontains => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;
    use crate::schema::Schema;
    use serde_json::{Value, json};

    fn schema() -> Schema {
        Schema::builder()
            .filterable("title", FieldKind::Text)
            .filterable("tags", FieldKind::List)
            .filterable("downloads", FieldKind::Numeric)
            .computed("tag_count", FieldKind::Numeric)
            .build()
    }

    fn items() -> Vec<Value> {
        vec![
            json!({"title": "Open Science", "tags": ["Data", "bio"], "downloads": 3}),
            json!({"title": "closed", "tags": ["data"], "downloads": 10}),
            json!({"title": "Open Science", "tags": ["Data", "bio"], "downloads": 3}),
        ]
    }

    #[test]
    fn text_filters_ignore_case_and_operator() {
        let schema = schema();
        let config = FilterConfig::default();
        let filter = ListFilter::new(FilterParser::new(&schema, &config), items());

        let params = QueryParams::new().with("filter[title][contains]", "SCIENCE");
        let result = filter.param_queryset(&params).unwrap();
        assert_eq!(result.len(), 1, "duplicates collapse");
        assert_eq!(result[0]["downloads"], 3);
    }

    #[test]
    fn list_membership_respects_case_for_contains() {
        let schema = schema();
        let config = FilterConfig::default();
        let filter = ListFilter::new(FilterParser::new(&schema, &config), items());

        let exact = filter.param_queryset(&QueryParams::new().with("filter[tags]", "data")).unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0]["title"], "closed");

        let loose = filter
            .param_queryset(&QueryParams::new().with("filter[tags][icontains]", "data"))
            .unwrap();
        assert_eq!(loose.len(), 2);
    }

    #[test]
    fn computed_fields_use_accessors() {
        let schema = schema();
        let config = FilterConfig::default();
        let params = QueryParams::new().with("filter[tag_count][gte]", "2");

        let filter = ListFilter::new(FilterParser::new(&schema, &config), items()).with_accessor("tag_count", |item: &Value| {
            item["tags"].as_array().map(|tags| FieldValue::Number(tags.len() as f64))
        });
        let result = filter.param_queryset(&params).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0]["title"], "Open Science");

        let unregistered = ListFilter::new(FilterParser::new(&schema, &config), items());
        assert!(unregistered.param_queryset(&params).unwrap().is_empty());
    }

    #[test]
    fn comparison_operators() {
        let cases = [
            (FilterOperator::Eq, 3.0, true),
            (FilterOperator::Lt, 3.0, false),
            (FilterOperator::Lte, 3.0, true),
            (FilterOperator::Gt, 2.0, true),
            (FilterOperator::Gte, 4.0, false),
        ];
        for (operator, bound, expected) in cases {
            assert_eq!(
                value_matches(FieldKind::Numeric, operator, &FilterValue::Number(bound), &FieldValue::Number(3.0)),
                expected,
                "{operator} {bound}"
            );
        }
        assert!(!value_matches(
            FieldKind::Numeric,
            FilterOperator::Eq,
            &FilterValue::Number(3.0),
            &FieldValue::Null
        ));
    }

    #[test]
    fn empty_request_returns_default_untouched() {
        let schema = schema();
        let config = FilterConfig::default();
        let filter = ListFilter::new(FilterParser::new(&schema, &config), items());

        assert_eq!(filter.queryset_from_request(&QueryParams::new()).unwrap().len(), 3);
        assert_eq!(filter.param_queryset(&QueryParams::new()).unwrap().len(), 2);
    }
}
