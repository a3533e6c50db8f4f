use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use qsfilter::{FilterConfig, FilterParser, Schema};

/// Default schema file looked up in the working directory
pub const DEFAULT_SCHEMA_FILE: &str = "qsfilter.schema.toml";

/// Schema and filter settings shared by every command
pub struct CliContext {
    pub schema_path: PathBuf,
    pub schema: Schema,
    pub config: FilterConfig,
}

impl CliContext {
    /// Load the schema file and the optional settings file
    pub fn load(schema_path: &Path, config_path: Option<&Path>) -> Result<Self> {
        let schema =
            Schema::load(schema_path).with_context(|| format!("Failed to load schema from {}", schema_path.display()))?;
        let config = FilterConfig::load_or_default(config_path).context("Failed to load filter settings")?;

        Ok(Self {
            schema_path: schema_path.to_path_buf(),
            schema,
            config,
        })
    }

    pub fn parser(&self) -> FilterParser<'_> {
        FilterParser::new(&self.schema, &self.config)
    }
}
