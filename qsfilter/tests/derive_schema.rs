//! `#[derive(FilterSchema)]` on plain structs, used with the in-memory filter.

use chrono::{DateTime, TimeZone, Utc};
use qsfilter::{
    DeclaredSchema, FieldKind, FieldSource, FieldValue, FilterConfig, FilterError, FilterParser, FilterSchema,
    FilterTarget, ListFilter, QueryParams,
};

#[derive(Debug, Clone, PartialEq, FilterSchema)]
#[filter(computed(name = "contributor_count", kind = "numeric"))]
struct Node {
    #[filter(filterable, sortable)]
    title: String,
    #[filter(filterable)]
    tags: Vec<String>,
    #[filter(filterable, rename = "is_public")]
    public: bool,
    #[filter(filterable, sortable)]
    downloads: u32,
    #[filter(filterable, sortable, rename = "date_created")]
    created: DateTime<Utc>,
    #[filter(filterable)]
    license: Option<String>,
    description: String,
    #[filter(skip)]
    contributors: Vec<String>,
}

fn node(title: &str, public: bool, downloads: u32, day: u32, contributors: &[&str]) -> Node {
    Node {
        title: title.to_string(),
        tags: vec!["science".to_string(), title.to_lowercase()],
        public,
        downloads,
        created: Utc.with_ymd_and_hms(2020, 5, day, 12, 0, 0).unwrap(),
        license: None,
        description: String::new(),
        contributors: contributors.iter().map(|name| name.to_string()).collect(),
    }
}

fn nodes() -> Vec<Node> {
    vec![
        node("Alpha", true, 10, 1, &["ann"]),
        node("Beta", false, 3, 2, &["bob", "cy"]),
        node("Gamma", true, 42, 2, &[]),
        node("Delta", true, 7, 3, &["dee", "ed", "flo"]),
    ]
}

#[test]
fn derived_schema_lists_declared_fields() {
    let schema = Node::schema();
    assert_eq!(schema.len(), 8);

    let public = schema.field("is_public").unwrap();
    assert_eq!(public.kind, FieldKind::Boolean);
    assert_eq!(public.source, FieldSource::Attribute("public".to_string()));
    assert!(!public.sortable);

    assert_eq!(schema.field("tags").unwrap().kind, FieldKind::List);
    assert_eq!(schema.field("license").unwrap().kind, FieldKind::Text);
    assert_eq!(schema.field("date_created").unwrap().kind, FieldKind::Temporal);
    assert!(!schema.field("description").unwrap().filterable);
    assert!(schema.field("contributors").is_none());
    assert!(schema.field("contributor_count").unwrap().is_computed());
}

#[test]
fn derived_target_reads_struct_fields() {
    let item = node("Alpha", true, 10, 1, &[]);
    assert_eq!(item.field_value("public"), Some(FieldValue::Bool(true)));
    assert_eq!(item.field_value("downloads"), Some(FieldValue::Number(10.0)));
    assert_eq!(item.field_value("license"), Some(FieldValue::Null));
    assert_eq!(item.field_value("is_public"), None);
}

#[test]
fn in_memory_filtering_uses_sources() {
    let schema = Node::schema();
    let config = FilterConfig::default();
    let filter = ListFilter::new(FilterParser::new(&schema, &config), nodes());

    let params = QueryParams::from_query_string("filter[is_public]=true&filter[downloads][gte]=8");
    let titles: Vec<String> = filter
        .queryset_from_request(&params)
        .unwrap()
        .into_iter()
        .map(|node| node.title)
        .collect();
    assert_eq!(titles, vec!["Alpha", "Gamma"]);
}

#[test]
fn date_equality_matches_the_whole_day() {
    let schema = Node::schema();
    let config = FilterConfig::default();
    let filter = ListFilter::new(FilterParser::new(&schema, &config), nodes());

    let params = QueryParams::new().with("filter[date_created]", "2020-05-02");
    let result = filter.param_queryset(&params).unwrap();
    assert_eq!(result.len(), 2);
    assert!(result.iter().all(|node| node.title == "Beta" || node.title == "Gamma"));
}

#[test]
fn ordering_sorts_the_filtered_collection() {
    let schema = Node::schema();
    let config = FilterConfig::default();
    let filter = ListFilter::new(FilterParser::new(&schema, &config), nodes());

    let params = QueryParams::from_query_string("filter[tags]=science&sort=-date_created,title");
    let titles: Vec<String> = filter
        .queryset_from_request(&params)
        .unwrap()
        .into_iter()
        .map(|node| node.title)
        .collect();
    assert_eq!(titles, vec!["Delta", "Beta", "Gamma", "Alpha"]);
}

#[test]
fn computed_field_accessor() {
    let schema = Node::schema();
    let config = FilterConfig::default();
    let filter = ListFilter::new(FilterParser::new(&schema, &config), nodes())
        .with_accessor("contributor_count", |node: &Node| {
            Some(FieldValue::Number(node.contributors.len() as f64))
        });

    let params = QueryParams::new().with("filter[contributor_count][gt]", "1");
    let titles: Vec<String> = filter
        .param_queryset(&params)
        .unwrap()
        .into_iter()
        .map(|node| node.title)
        .collect();
    assert_eq!(titles, vec!["Beta", "Delta"]);
}

#[test]
fn errors_propagate_from_the_parser() {
    let schema = Node::schema();
    let config = FilterConfig::default();
    let filter = ListFilter::new(FilterParser::new(&schema, &config), nodes());

    let err = filter
        .queryset_from_request(&QueryParams::new().with("filter[description]", "x"))
        .unwrap_err();
    assert!(matches!(err, FilterError::InvalidFilterField { .. }));
}
