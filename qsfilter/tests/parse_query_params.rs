//! Request parsing against a node-like schema.

use chrono::{TimeZone, Utc};
use qsfilter::{
    FieldKind, FilterConfig, FilterError, FilterOperator, FilterParser, FilterValue, QueryParams, ResolvedFilter, Schema,
};

fn node_schema() -> Schema {
    Schema::builder()
        .filterable("title", FieldKind::Text)
        .filterable("tags", FieldKind::List)
        .filterable("is_public", FieldKind::Boolean)
        .filterable("downloads", FieldKind::Numeric)
        .sourced("date_created", FieldKind::Temporal, "created")
        .declared("description", FieldKind::Text)
        .build()
}

fn parse(query: &str) -> Result<Vec<ResolvedFilter>, FilterError> {
    let schema = node_schema();
    let config = FilterConfig::default();
    FilterParser::new(&schema, &config).parse_query_params(&QueryParams::from_query_string(query))
}

#[test]
fn icontains_on_text_yields_one_filter() {
    let filters = parse("filter[title][icontains]=science").unwrap();
    assert_eq!(filters.len(), 1);
    assert_eq!(filters[0].field, "title");
    assert_eq!(filters[0].operator, FilterOperator::Icontains);
    assert_eq!(filters[0].value, FilterValue::Text("science".to_string()));
}

#[test]
fn valid_triples_yield_exactly_one_filter() {
    let queries = [
        "filter[title][eq]=Open Science",
        "filter[title][contains]=sci",
        "filter[tags][icontains]=Bio",
        "filter[is_public][eq]=true",
        "filter[downloads][lt]=10",
        "filter[downloads][gte]=2.5",
        "filter[date_created][gt]=2020-05-01",
        "filter[date_created][eq]=2020-05-01T10:30:00Z",
    ];
    for query in queries {
        let filters = parse(query).unwrap_or_else(|err| panic!("{query}: {err}"));
        assert_eq!(filters.len(), 1, "{query}");
    }
}

#[test]
fn date_only_equality_expands_to_a_day() {
    let filters = parse("filter[date_created]=2020-05-01").unwrap();
    assert_eq!(filters.len(), 2);

    assert_eq!(filters[0].operator, FilterOperator::Gte);
    assert_eq!(
        filters[0].value,
        FilterValue::DateTime(Utc.with_ymd_and_hms(2020, 5, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(filters[1].operator, FilterOperator::Lt);
    assert_eq!(
        filters[1].value,
        FilterValue::DateTime(Utc.with_ymd_and_hms(2020, 5, 2, 0, 0, 0).unwrap())
    );
    assert!(filters.iter().all(|filter| filter.target == "created"));
}

#[test]
fn month_end_dates_roll_over() {
    let filters = parse("filter[date_created][eq]=December 31, 2019").unwrap();
    assert_eq!(
        filters[1].value,
        FilterValue::DateTime(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
    );
}

#[test]
fn unknown_operators_are_rejected() {
    for op in ["between", "ne", "EQ", "startswith"] {
        let err = parse(&format!("filter[downloads][{op}]=1")).unwrap_err();
        assert_eq!(
            err,
            FilterError::InvalidFilterOperator {
                value: op.to_string()
            }
        );
    }
}

#[test]
fn comparison_on_text_is_rejected() {
    for op in ["lt", "lte", "gt", "gte"] {
        let err = parse(&format!("filter[title][{op}]=a")).unwrap_err();
        assert!(matches!(err, FilterError::InvalidFilterComparisonType { .. }), "{op}");
    }
}

#[test]
fn match_on_numeric_is_rejected() {
    for op in ["contains", "icontains"] {
        let err = parse(&format!("filter[downloads][{op}]=1")).unwrap_err();
        assert!(matches!(err, FilterError::InvalidFilterMatchType { .. }), "{op}");
    }
}

#[test]
fn comparison_on_boolean_is_rejected() {
    let err = parse("filter[is_public][gt]=true").unwrap_err();
    assert_eq!(
        err,
        FilterError::InvalidFilterComparisonType {
            attribute: "is_public".to_string()
        }
    );
}

#[test]
fn boolean_tokens_coerce() {
    for token in ["true", "1", "yes", "Y", "on", "T"] {
        let filters = parse(&format!("filter[is_public]={token}")).unwrap();
        assert_eq!(filters[0].value, FilterValue::Bool(true), "{token}");
    }
    for token in ["false", "0", "no", "N", "off", "f"] {
        let filters = parse(&format!("filter[is_public]={token}")).unwrap();
        assert_eq!(filters[0].value, FilterValue::Bool(false), "{token}");
    }
    let err = parse("filter[is_public]=maybe").unwrap_err();
    assert_eq!(
        err,
        FilterError::InvalidFilterValue {
            value: "maybe".to_string(),
            field_type: "bool"
        }
    );
}

#[test]
fn bad_values_name_the_expected_type() {
    assert!(matches!(
        parse("filter[downloads]=lots").unwrap_err(),
        FilterError::InvalidFilterValue { field_type: "number", .. }
    ));
    assert!(matches!(
        parse("filter[date_created]=yesterday").unwrap_err(),
        FilterError::InvalidFilterValue { field_type: "date", .. }
    ));
}

#[test]
fn unknown_and_unfilterable_fields_differ() {
    let unknown = parse("filter[nope]=1").unwrap_err();
    assert_eq!(unknown.to_string(), "'nope' is not a valid field for this endpoint.");
    assert_eq!(unknown.to_detail().source.map(|source| source.parameter), Some("filter[nope]".to_string()));

    let hidden = parse("filter[description]=x").unwrap_err();
    assert!(matches!(hidden, FilterError::InvalidFilterField { .. }));
    assert_eq!(hidden.status(), 400);
}

#[test]
fn repeated_filters_are_all_applied() {
    let filters = parse("filter[downloads][gte]=1&filter[downloads][lt]=10&page=2").unwrap();
    assert_eq!(filters.len(), 2);
    assert_eq!(filters[0].value, FilterValue::Number(1.0));
    assert_eq!(filters[1].value, FilterValue::Number(10.0));
}

#[test]
fn non_filter_parameters_are_ignored() {
    assert!(parse("page=2&sort=title&filterx=1").unwrap().is_empty());
}

#[test]
fn custom_boolean_tokens_from_config() {
    let schema = node_schema();
    let config = FilterConfig::from_toml_str(
        r#"
[filters]
truthy = ["ja"]
falsy = ["nein"]
"#,
    )
    .unwrap();
    let parser = FilterParser::new(&schema, &config);

    let filters = parser
        .parse_query_params(&QueryParams::new().with("filter[is_public]", "JA"))
        .unwrap();
    assert_eq!(filters[0].value, FilterValue::Bool(true));
    assert!(
        parser
            .parse_query_params(&QueryParams::new().with("filter[is_public]", "true"))
            .is_err()
    );
}
