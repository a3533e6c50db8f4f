//! qsfilter core library.
//!
//! Parses `filter[<field>][<op>]=<value>` query parameters against a declared
//! [`Schema`] and materializes them either as a RediSearch [`search::Query`] or
//! by filtering an in-memory collection with [`ListFilter`].
//!
//! ```
//! use qsfilter::{FieldKind, FilterConfig, FilterParser, QueryParams, Schema};
//!
//! let schema = Schema::builder().filterable("title", FieldKind::Text).build();
//! let config = FilterConfig::default();
//! let parser = FilterParser::new(&schema, &config);
//!
//! let params = QueryParams::from_query_string("filter[title]=science");
//! let filters = parser.parse_query_params(&params).unwrap();
//! assert_eq!(filters[0].operator, qsfilter::FilterOperator::Icontains);
//! ```

extern crate self as qsfilter;

pub mod collection;
pub mod config;
pub mod errors;
pub mod filters;
pub mod schema;
pub mod search;
pub mod values;

pub use collection::ListFilter;
pub use config::{FilterConfig, FilterSettings, PagingConfig};
pub use errors::*;
pub use filters::{FilterOperator, FilterParser, FilterSpec, Ordering, QueryParams, ResolvedFilter, SortOrder, SortTerm};
pub use qsfilter_macros::FilterSchema;
pub use schema::{DeclaredSchema, FieldDescriptor, FieldKind, FieldSource, Schema, SchemaBuilder};
pub use search::{OdmFilter, Query, SearchParams};
pub use values::{FieldValue, FilterTarget, FilterValue, IntoFieldValue};

pub use redis;
pub use redis::aio::ConnectionManager;
