use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Table};
use redis::aio::ConnectionManager;
use serde::Serialize;
use serde_json::Value;

use qsfilter::{FilterTarget, OdmFilter};
use qsfilter::search::store::{IndexDefinition, RediSearchStore, SearchResult};

use super::query::base_query;
use super::{filter_failure, request_params};
use crate::context::CliContext;
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay, themed_table};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Search Redis",
    commands: &[
        "qsfilter search 'filter[title]=science' --index idx:nodes --prefix node:",
        "qsfilter search 'filter[downloads][gte]=10&sort=-downloads' --index idx:nodes --prefix node: --create-index",
        "REDIS_URL=redis://localhost:6379 qsfilter --output json search 'page=2' --index idx:nodes --prefix node:",
    ],
}];

#[derive(Args)]
pub struct SearchArgs {
    /// Request query string
    query: String,

    /// RediSearch index name
    #[arg(long)]
    index: String,

    /// Key prefix of the indexed documents (repeatable)
    #[arg(long = "prefix", required = true)]
    prefixes: Vec<String>,

    /// Default query the request filters are intersected with (raw RediSearch syntax)
    #[arg(long)]
    base: Option<String>,

    /// Create the index from the schema when it does not exist
    #[arg(long)]
    create_index: bool,

    /// Redis connection URL
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    redis_url: String,
}

struct SearchReport<'a> {
    columns: Vec<String>,
    result: &'a SearchResult<Value>,
}

impl Serialize for SearchReport<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.result.serialize(serializer)
    }
}

impl TableDisplay for SearchReport<'_> {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let headers: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        let mut table = themed_table(options, &headers);
        for item in &self.result.items {
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
        format!(
            "Count: {} Total: {} Page: {}",
            self.result.items.len(),
            self.result.total,
            self.result.page
        )
    }
}

/// Document attributes behind the indexed fields; dotted targets address nested values.
fn indexed_targets(definition: &IndexDefinition) -> Vec<String> {
    definition.schema.iter().map(|field| field.field_name.clone()).collect()
}

pub async fn handle_search(args: SearchArgs, ctx: &CliContext, output: &OutputManager) -> Result<()> {
    let params = request_params(&args.query, output);
    let filter = OdmFilter::new(ctx.parser(), base_query(args.base.as_deref()));
    let search = filter.search_params(&params).map_err(|err| filter_failure(err, output))?;
    output.verbose(&format!("FT.SEARCH {} {}", args.index, search.query.to_query_string()));

    output.progress("Connecting to Redis");
    let client = redis::Client::open(args.redis_url.as_str()).context("Failed to create Redis client")?;
    let mut conn = ConnectionManager::new(client).await.context("Failed to connect to Redis")?;
    output.clear_line();
    output.success("Connected to Redis");

    let store = RediSearchStore::new(IndexDefinition::from_schema(&args.index, args.prefixes, &ctx.schema));
    if args.create_index {
        store.ensure_index(&mut conn).await.context("Failed to create search index")?;
    }

    let result = store
        .search::<Value>(&mut conn, &search)
        .await
        .with_context(|| format!("Search on index {} failed", args.index))?;

    output.heading(&format!("{} result(s), page {}", result.total, result.page));
    let columns = indexed_targets(store.definition());
    output.display(&SearchReport {
        columns,
        result: &result,
    })?;
    if result.has_more() {
        output.info(&format!("More results on page {}", result.page + 1));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsfilter::{FieldKind, Schema};
    use serde_json::json;

    #[test]
    fn table_cells_follow_dotted_targets() {
        let schema = Schema::builder()
            .filterable("title", FieldKind::Text)
            .sourced("owner", FieldKind::Text, "owner.name")
            .declared("notes", FieldKind::Text)
            .build();
        let definition = IndexDefinition::from_schema("idx:nodes", vec!["node:".to_string()], &schema);
        let columns = indexed_targets(&definition);
        assert_eq!(columns, vec!["title", "owner.name"]);

        let result = SearchResult {
            items: vec![json!({"title": "Open Science", "owner": {"name": "ann"}})],
            total: 1,
            page: 1,
            page_size: 25,
        };
        let report = SearchReport {
            columns,
            result: &result,
        };
        let rendered = report.to_table(&GlobalOptions::default()).to_string();
        assert!(rendered.contains("Open Science"));
        assert!(rendered.contains("ann"));
    }
}
