use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};
use serde::Serialize;

use qsfilter::{Ordering, ResolvedFilter};

use super::{filter_failure, request_params};
use crate::context::CliContext;
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay, themed_table};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Resolve Filters",
        commands: &[
            "qsfilter parse 'filter[title]=science'",
            "qsfilter parse 'filter[date_created]=2020-05-01'      # Expands to a day range",
            "qsfilter parse 'filter[downloads][gte]=10&sort=-date_created'",
        ],
    },
    ExampleGroup {
        title: "Error Responses",
        commands: &["qsfilter --output json parse 'filter[is_public][gt]=true'"],
    },
];

#[derive(Args)]
pub struct ParseArgs {
    /// Request query string, e.g. 'filter[title][icontains]=science'
    query: String,
}

#[derive(Serialize)]
struct ParseReport {
    filters: Vec<ResolvedFilter>,
    ordering: Ordering,
}

impl TableDisplay for ParseReport {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(options, &["Field", "Target", "Kind", "Operator", "Value"]);
        for filter in &self.filters {
            let target = if filter.computed {
                "(computed)".to_string()
            } else {
                filter.target.clone()
            };
            table.add_row(vec![
                Cell::new(&filter.field),
                Cell::new(target),
                Cell::new(filter.kind.as_str()),
                Cell::new(filter.operator.as_str()),
                Cell::new(filter.value.to_query_string()),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.filters
            .iter()
            .map(|filter| format!("{} {} {}", filter.field, filter.operator, filter.value.to_query_string()))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub fn handle_parse(args: ParseArgs, ctx: &CliContext, output: &OutputManager) -> Result<()> {
    let params = request_params(&args.query, output);
    let parser = ctx.parser();

    let filters = parser.parse_query_params(&params).map_err(|err| filter_failure(err, output))?;
    let ordering = parser.parse_ordering(&params);

    output.heading("Resolved Filters");
    if filters.is_empty() {
        output.info("No filter parameters in the request");
    }

    output.display(&ParseReport {
        filters,
        ordering: ordering.clone(),
    })?;

    for term in &ordering.terms {
        output.key_value("sort", &format!("{} {}", term.target, term.order.as_str()));
    }
    Ok(())
}
