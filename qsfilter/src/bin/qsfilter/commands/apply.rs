use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Table};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

use qsfilter::{FilterTarget, ListFilter};

use super::{filter_failure, request_params};
use crate::context::CliContext;
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay, themed_table};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Filter a JSON Collection",
    commands: &[
        "qsfilter apply 'filter[title]=science' --data nodes.json",
        "qsfilter apply 'filter[tags][icontains]=Biology&sort=-downloads' --data nodes.json",
        "qsfilter --output json apply 'filter[is_public]=yes' --data nodes.json",
    ],
}];

#[derive(Args)]
pub struct ApplyArgs {
    /// Request query string
    query: String,

    /// JSON file holding an array of documents
    #[arg(long, short = 'd')]
    data: PathBuf,
}

#[derive(Serialize)]
#[serde(transparent)]
struct ApplyReport {
    #[serde(skip)]
    columns: Vec<String>,
    items: Vec<Value>,
}

impl TableDisplay for ApplyReport {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let headers: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        let mut table = themed_table(options, &headers);
        for item in &self.items {
            let cells: Vec<Cell> = self
                .columns
                .iter()
                .map(|column| Cell::new(item.field_value(column).map(|value| value.display()).unwrap_or_default()))
                .collect();
            table.add_row(cells);
        }
        table
    }

    fn to_compact(&self) -> String {
        format!("Count: {}", self.items.len())
    }
}

pub async fn handle_apply(args: ApplyArgs, ctx: &CliContext, output: &OutputManager) -> Result<()> {
    let content = tokio::fs::read_to_string(&args.data)
        .await
        .with_context(|| format!("Failed to read {}", args.data.display()))?;
    let documents: Vec<Value> =
        serde_json::from_str(&content).with_context(|| format!("{} must hold a JSON array", args.data.display()))?;
    output.verbose(&format!("loaded {} document(s)", documents.len()));

    if ctx.schema.fields().iter().any(|field| field.is_computed()) {
        output.warning("Computed fields have no accessor on the command line; filters on them match nothing");
    }

    let params = request_params(&args.query, output);
    let filter = ListFilter::new(ctx.parser(), documents);
    let items = filter.queryset_from_request(&params).map_err(|err| filter_failure(err, output))?;

    output.heading(&format!("{} of {} document(s) matched", items.len(), filter.default_collection().len()));

    let columns = ctx
        .schema
        .fields()
        .iter()
        .filter(|field| !field.is_computed())
        .map(|field| field.target().to_string())
        .collect();
    output.display(&ApplyReport { columns, items })
}
