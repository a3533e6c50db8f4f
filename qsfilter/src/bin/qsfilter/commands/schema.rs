use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};
use serde::Serialize;

use qsfilter::{FieldDescriptor, FieldSource};

use crate::context::CliContext;
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay, themed_table};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Inspect Fields",
    commands: &[
        "qsfilter schema                        # List every declared field",
        "qsfilter schema --filterable           # Only fields clients may filter on",
        "qsfilter --output json schema          # Machine-readable field list",
    ],
}];

#[derive(Args)]
pub struct SchemaArgs {
    /// Only list filterable fields
    #[arg(long)]
    filterable: bool,
}

#[derive(Serialize)]
struct FieldRow {
    name: String,
    kind: &'static str,
    filterable: bool,
    sortable: bool,
    source: String,
    default_operator: &'static str,
    operators: Vec<&'static str>,
}

impl From<&FieldDescriptor> for FieldRow {
    fn from(field: &FieldDescriptor) -> Self {
        let source = match &field.source {
            FieldSource::Declared => String::new(),
            FieldSource::Attribute(attribute) => attribute.clone(),
            FieldSource::Computed => "(computed)".to_string(),
        };
        Self {
            name: field.name.clone(),
            kind: field.kind.as_str(),
            filterable: field.filterable,
            sortable: field.sortable,
            source,
            default_operator: field.kind.default_operator().as_str(),
            operators: field.kind.allowed_operators().iter().map(|op| op.as_str()).collect(),
        }
    }
}

#[derive(Serialize)]
struct SchemaReport {
    fields: Vec<FieldRow>,
}

impl TableDisplay for SchemaReport {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(
            options,
            &["Field", "Kind", "Filterable", "Sortable", "Source", "Operators"],
        );
        for row in &self.fields {
            let operators = row
                .operators
                .iter()
                .map(|op| {
                    if *op == row.default_operator {
                        format!("{op}*")
                    } else {
                        op.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            table.add_row(vec![
                Cell::new(&row.name),
                Cell::new(row.kind),
                Cell::new(yes_no(row.filterable)),
                Cell::new(yes_no(row.sortable)),
                Cell::new(&row.source),
                Cell::new(operators),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.fields
            .iter()
            .map(|row| format!("{}:{}", row.name, row.kind))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

pub fn handle_schema(args: SchemaArgs, ctx: &CliContext, output: &OutputManager) -> Result<()> {
    output.heading(&format!("Schema {}", ctx.schema_path.display()));

    let fields: Vec<FieldRow> = ctx
        .schema
        .fields()
        .iter()
        .filter(|field| !args.filterable || field.filterable)
        .map(FieldRow::from)
        .collect();

    if fields.is_empty() {
        output.warning("No fields to show");
        return Ok(());
    }

    output.display(&SchemaReport { fields })?;
    output.info("* marks the operator used when a filter omits [op]");
    Ok(())
}
