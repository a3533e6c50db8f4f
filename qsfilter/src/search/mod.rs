//! Mapped-store materializer.
//!
//! Resolved filters become [`Query`] predicates, are ANDed together and then
//! intersected with the caller's default query. A [`Query`] renders to
//! RediSearch syntax so it can be executed by [`store::RediSearchStore`].
//!
//! ```
//! use qsfilter::config::FilterConfig;
//! use qsfilter::filters::{FilterParser, QueryParams};
//! use qsfilter::schema::{FieldKind, Schema};
//! use qsfilter::search::{OdmFilter, Query};
//!
//! let schema = Schema::builder().filterable("title", FieldKind::Text).build();
//! let config = FilterConfig::default();
//! let filter = OdmFilter::new(FilterParser::new(&schema, &config), Query::raw("@public:{true}"));
//!
//! let params = QueryParams::from_query_string("filter[title]=science");
//! let query = filter.query_from_request(&params).unwrap();
//! assert_eq!(query.to_query_string(), "((@title:*science*) (@public:{true}))");
//! ```

mod escape;
pub mod store;

use std::ops::BitAnd;

use crate::config::DEFAULT_PAGE;
use crate::errors::FilterResult;
use crate::filters::{FilterOperator, FilterParser, QueryParams, ResolvedFilter, SortTerm};
use crate::schema::FieldKind;
use crate::values::FilterValue;

pub use escape::{escape_for_tag_query, escape_for_text_contains, escape_for_text_exact};
use escape::format_numeric;

const TAG_SEPARATOR: &str = "|";

/// A single field condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub kind: FieldKind,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl Predicate {
    pub fn new(field: impl Into<String>, kind: FieldKind, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            kind,
            operator,
            value,
        }
    }

    pub fn to_query_clause(&self) -> String {
        let field = &self.field;
        match self.kind {
            FieldKind::Numeric | FieldKind::Temporal => match numeric_bound(&self.value) {
                Some(bound) => {
                    let bound = format_numeric(bound);
                    let (min, max) = match self.operator {
                        FilterOperator::Gt => (format!("({bound}"), "+inf".to_string()),
                        FilterOperator::Gte => (bound, "+inf".to_string()),
                        FilterOperator::Lt => ("-inf".to_string(), format!("({bound}")),
                        FilterOperator::Lte => ("-inf".to_string(), bound),
                        _ => (bound.clone(), bound),
                    };
                    format!("(@{field}:[{min} {max}])")
                }
                None => self.tag_clause(),
            },
            FieldKind::Text => match self.operator {
                FilterOperator::Eq => format!("(@{field}:{})", escape_for_text_exact(&self.value.to_query_string())),
                _ => format!("(@{field}:{})", escape_for_text_contains(&self.value.to_query_string())),
            },
            FieldKind::Boolean | FieldKind::List => self.tag_clause(),
        }
    }

    fn tag_clause(&self) -> String {
        format!(
            "(@{}:{{{}}})",
            self.field,
            escape_for_tag_query(&self.value.to_query_string())
        )
    }
}

/// Temporal values are indexed as epoch milliseconds.
fn numeric_bound(value: &FilterValue) -> Option<f64> {
    match value {
        FilterValue::Number(number) => Some(*number),
        FilterValue::DateTime(at) => Some(at.timestamp_millis() as f64),
        FilterValue::Bool(_) | FilterValue::Text(_) => None,
    }
}

impl From<&ResolvedFilter> for Predicate {
    fn from(filter: &ResolvedFilter) -> Self {
        Self {
            field: filter.target.clone(),
            kind: filter.kind,
            operator: filter.operator,
            value: filter.value.clone(),
        }
    }
}

/// Composable query object handed to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Matches every document.
    MatchAll,
    /// Pre-rendered RediSearch clause, used for base queries such as tenant scoping.
    Raw(String),
    Predicate(Predicate),
    And(Vec<Query>),
    Or(Vec<Query>),
}

impl Query {
    #[inline]
    pub fn raw(clause: impl Into<String>) -> Self {
        Self::Raw(clause.into())
    }

    #[inline]
    pub fn and(queries: impl IntoIterator<Item = Query>) -> Self {
        Self::And(queries.into_iter().collect())
    }

    #[inline]
    pub fn or(queries: impl IntoIterator<Item = Query>) -> Self {
        Self::Or(queries.into_iter().collect())
    }

    /// AND of all resolved filters, or `None` when there are none.
    pub fn from_filters(filters: &[ResolvedFilter]) -> Option<Self> {
        let mut parts = filters.iter().map(|filter| Query::Predicate(Predicate::from(filter)));
        let first = parts.next()?;
        Some(parts.fold(first, |acc, part| acc & part))
    }

    /// Render as a RediSearch clause; `MatchAll` renders empty.
    pub fn to_query_clause(&self) -> String {
        match self {
            Self::MatchAll => String::new(),
            Self::Raw(raw) => {
                if raw.trim().is_empty() {
                    String::new()
                } else {
                    format!("({raw})")
                }
            }
            Self::Predicate(predicate) => predicate.to_query_clause(),
            Self::And(queries) => join_clauses(queries, " "),
            Self::Or(queries) => join_clauses(queries, TAG_SEPARATOR),
        }
    }

    /// Render as a complete query string (`*` when nothing constrains it).
    pub fn to_query_string(&self) -> String {
        let clause = self.to_query_clause();
        if clause.is_empty() { "*".to_string() } else { clause }
    }
}

fn join_clauses(queries: &[Query], separator: &str) -> String {
    let clauses: Vec<String> = queries
        .iter()
        .map(Query::to_query_clause)
        .filter(|clause| !clause.is_empty())
        .collect();
    match clauses.len() {
        0 => String::new(),
        1 => clauses.into_iter().next().unwrap_or_default(),
        _ => format!("({})", clauses.join(separator)),
    }
}

impl BitAnd for Query {
    type Output = Query;

    /// Flattens nested ANDs; `MatchAll` is the identity.
    fn bitand(self, rhs: Query) -> Query {
        match (self, rhs) {
            (Query::MatchAll, other) | (other, Query::MatchAll) => other,
            (Query::And(mut left), Query::And(right)) => {
                left.extend(right);
                Query::And(left)
            }
            (Query::And(mut left), other) => {
                left.push(other);
                Query::And(left)
            }
            (other, Query::And(right)) => {
                let mut parts = Vec::with_capacity(right.len() + 1);
                parts.push(other);
                parts.extend(right);
                Query::And(parts)
            }
            (left, right) => Query::And(vec![left, right]),
        }
    }
}

/// Everything a store needs to run one request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub query: Query,
    pub sort: Option<SortTerm>,
    pub page: u64,
    pub page_size: u64,
}

impl SearchParams {
    /// Saturates for page numbers past the addressable range.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// Mapped-store materializer: request filters ANDed onto a default query.
#[derive(Debug, Clone)]
pub struct OdmFilter<'a> {
    parser: FilterParser<'a>,
    default_query: Query,
}

impl<'a> OdmFilter<'a> {
    pub fn new(parser: FilterParser<'a>, default_query: Query) -> Self {
        Self { parser, default_query }
    }

    pub fn default_query(&self) -> &Query {
        &self.default_query
    }

    /// Convert filter parameters to a query; `None` when there are none.
    pub fn query_params_to_query(&self, params: &QueryParams) -> FilterResult<Option<Query>> {
        let filters = self.parser.parse_query_params(params)?;
        Ok(Query::from_filters(&filters))
    }

    /// Request filters intersected with the default query.
    pub fn query_from_request(&self, params: &QueryParams) -> FilterResult<Query> {
        Ok(match self.query_params_to_query(params)? {
            Some(param_query) => param_query & self.default_query.clone(),
            None => self.default_query.clone(),
        })
    }

    /// Query plus ordering and paging (`page`, `page[size]`) for the store.
    pub fn search_params(&self, params: &QueryParams) -> FilterResult<SearchParams> {
        let query = self.query_from_request(params)?;
        let sort = self.parser.parse_ordering(params).primary().cloned();
        let paging = &self.parser.config().paging;
        let page = params
            .get("page")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_PAGE)
            .max(1);
        let page_size = paging.page_size(params.get("page[size]").and_then(|raw| raw.trim().parse::<u64>().ok()));
        Ok(SearchParams {
            query,
            sort,
            page,
            page_size,
        })
    }
}
