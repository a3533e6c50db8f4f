mod commands;
mod context;
mod examples;
mod output;
mod theme;

use anyhow::Result;
use clap::{
    ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Style},
    },
};
use colored::{Colorize, control::ShouldColorize};
use std::fmt::Write;
use std::path::PathBuf;

use commands::{
    apply::{ApplyArgs, handle_apply},
    parse::{ParseArgs, handle_parse},
    query::{QueryArgs, handle_query},
    schema::{SchemaArgs, handle_schema},
    search::{SearchArgs, handle_search},
};
use context::{CliContext, DEFAULT_SCHEMA_FILE};
use examples::{ExampleGroup, command_examples};
use output::{GlobalOptions, OutputFormat, OutputManager};
use theme::{ICONS, THEME};

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("QSFILTER_SCHEMA", "Schema file used when --schema is not given"),
    ("QSFILTER_CONFIG", "Filter settings file used when --config is not given"),
    ("REDIS_URL", "Redis connection URL for the search command"),
    ("RUST_LOG", "Log filter, e.g. qsfilter=debug"),
];

#[derive(Parser)]
#[command(name = "qsfilter")]
#[command(version)]
#[command(
    about = "Inspect and run query-string filters against a declared schema",
    long_about = r#"Query-string filter tool that provides:

• Resolution of filter[<field>][<op>]=<value> parameters against a schema
• Rendering of requests as RediSearch queries
• In-memory filtering of JSON collections
• Searching a live RediSearch index

Commands:
  schema    List declared fields and their operators
  parse     Resolve the filters of a request
  query     Render a request as a RediSearch query
  apply     Filter a JSON array with a request
  search    Run a request against a RediSearch index
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Schema file (TOML) declaring the filterable fields
    #[arg(long, env = "QSFILTER_SCHEMA", default_value = DEFAULT_SCHEMA_FILE, global = true)]
    schema: PathBuf,

    /// Filter settings file (TOML)
    #[arg(long, env = "QSFILTER_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse arguments with themed help and per-command examples attached.
    fn parse_with_styles() -> Self {
        let matches = build_cli_command().get_matches();
        Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
    }
}

fn build_cli_command() -> Command {
    let use_color = ShouldColorize::from_env().should_colorize();
    let mut command = Cli::command()
        .styles(help_styles())
        .color(if use_color { ColorChoice::Auto } else { ColorChoice::Never })
        .after_long_help(render_environment(use_color));
    for example in command_examples() {
        if let Some(subcommand) = command.find_subcommand_mut(example.name) {
            *subcommand = subcommand.clone().after_long_help(render_examples(example.groups, use_color));
        }
    }
    command
}

fn heading(text: &str, use_color: bool) -> String {
    if use_color {
        text.color(THEME.highlight).bold().to_string()
    } else {
        text.to_string()
    }
}

fn render_examples(groups: &[ExampleGroup], use_color: bool) -> String {
    let mut buffer = String::new();
    let _ = writeln!(buffer, "{}", heading("Examples:", use_color));
    for group in groups {
        let _ = writeln!(buffer, "  {}", group.title);
        for command in group.commands {
            let _ = writeln!(buffer, "    {} {command}", ICONS.arrow);
        }
    }
    buffer
}

fn render_environment(use_color: bool) -> String {
    let mut buffer = String::new();
    let _ = writeln!(buffer, "{}", heading("Environment Variables:", use_color));
    for (key, description) in ENVIRONMENT_VARIABLES {
        let _ = writeln!(buffer, "  {key:<16}{description}");
    }
    buffer
}

fn help_styles() -> Styles {
    Styles::styled()
        .usage(Style::new().fg_color(Some(AnsiColor::BrightBlue.into())).bold())
        .header(Style::new().fg_color(Some(AnsiColor::Cyan.into())).bold())
        .literal(Style::new().fg_color(Some(AnsiColor::Magenta.into())))
        .placeholder(Style::new().fg_color(Some(AnsiColor::BrightBlack.into())))
        .error(Style::new().fg_color(Some(AnsiColor::Red.into())).bold())
}

#[derive(Subcommand)]
enum Commands {
    /// List declared fields, their kinds and operators
    Schema(SchemaArgs),

    /// Resolve the filters and ordering of a request
    Parse(ParseArgs),

    /// Render a request as a RediSearch query
    Query(QueryArgs),

    /// Filter a JSON array of documents in memory
    Apply(ApplyArgs),

    /// Run a request against a RediSearch index
    Search(SearchArgs),
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse_with_styles();
    if let Err(err) = execute(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let global_options = GlobalOptions {
        output_format: cli.output,
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    };
    if global_options.no_color {
        colored::control::set_override(false);
    }

    let output = OutputManager::new(global_options);
    let ctx = CliContext::load(&cli.schema, cli.config.as_deref())?;
    log::debug!("loaded {} field(s) from {}", ctx.schema.len(), ctx.schema_path.display());

    match cli.command {
        Commands::Schema(args) => handle_schema(args, &ctx, &output)?,
        Commands::Parse(args) => handle_parse(args, &ctx, &output)?,
        Commands::Query(args) => handle_query(args, &ctx, &output)?,
        Commands::Apply(args) => handle_apply(args, &ctx, &output).await?,
        Commands::Search(args) => handle_search(args, &ctx, &output).await?,
    }

    Ok(())
}
