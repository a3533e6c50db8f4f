use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};
use serde::Serialize;

use qsfilter::{OdmFilter, Query};

use super::{filter_failure, request_params};
use crate::context::CliContext;
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay, themed_table};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Render RediSearch Queries",
    commands: &[
        "qsfilter query 'filter[title]=science&filter[downloads][gt]=5'",
        "qsfilter query 'filter[tags]=biology' --base '@is_public:{true}'",
        "qsfilter query 'page=2&page[size]=50&sort=-date_created'",
    ],
}];

#[derive(Args)]
pub struct QueryArgs {
    /// Request query string
    query: String,

    /// Default query the request filters are intersected with (raw RediSearch syntax)
    #[arg(long)]
    base: Option<String>,
}

#[derive(Serialize)]
struct QueryReport {
    query: String,
    sort: Option<String>,
    page: u64,
    page_size: u64,
    offset: u64,
}

impl TableDisplay for QueryReport {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(options, &["Part", "Value"]);
        table.add_row(vec![Cell::new("query"), Cell::new(&self.query)]);
        table.add_row(vec![
            Cell::new("sort"),
            Cell::new(self.sort.as_deref().unwrap_or("-")),
        ]);
        table.add_row(vec![Cell::new("page"), Cell::new(self.page.to_string())]);
        table.add_row(vec![Cell::new("page size"), Cell::new(self.page_size.to_string())]);
        table.add_row(vec![Cell::new("offset"), Cell::new(self.offset.to_string())]);
        table
    }

    fn to_compact(&self) -> String {
        self.query.clone()
    }
}

/// Default query from the `--base` option
pub fn base_query(base: Option<&str>) -> Query {
    base.map(Query::raw).unwrap_or(Query::MatchAll)
}

pub fn handle_query(args: QueryArgs, ctx: &CliContext, output: &OutputManager) -> Result<()> {
    let params = request_params(&args.query, output);
    let filter = OdmFilter::new(ctx.parser(), base_query(args.base.as_deref()));

    let search = filter.search_params(&params).map_err(|err| filter_failure(err, output))?;
    if !params.has_filters() {
        output.info("No filter parameters; using the default query");
    }

    output.heading("RediSearch Query");
    output.display(&QueryReport {
        query: search.query.to_query_string(),
        sort: search
            .sort
            .as_ref()
            .map(|term| format!("{} {}", term.target, term.order.as_str())),
        page: search.page,
        page_size: search.page_size,
        offset: search.offset(),
    })
}
