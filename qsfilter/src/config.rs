use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 25;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Settings for the filter layer, constructed explicitly and handed to the
/// parser and stores that need them.
///
/// Loaded from a TOML file such as:
///
/// ```toml
/// [filters]
/// ordering_param = "sort"
/// truthy = ["true", "1"]
/// falsy = ["false", "0"]
///
/// [paging]
/// default_page_size = 25
/// max_page_size = 100
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub filters: FilterSettings,
    #[serde(default)]
    pub paging: PagingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Query parameter carrying the ordering (`sort=-date_created,title`).
    #[serde(default = "default_ordering_param")]
    pub ordering_param: String,
    /// Tokens coerced to `true` for boolean fields (case-insensitive).
    #[serde(default = "default_truthy")]
    pub truthy: Vec<String>,
    /// Tokens coerced to `false` for boolean fields (case-insensitive).
    #[serde(default = "default_falsy")]
    pub falsy: Vec<String>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            ordering_param: default_ordering_param(),
            truthy: default_truthy(),
            falsy: default_falsy(),
        }
    }
}

fn default_ordering_param() -> String {
    "sort".to_string()
}

fn default_truthy() -> Vec<String> {
    ["true", "t", "1", "yes", "y", "on"].map(String::from).to_vec()
}

fn default_falsy() -> Vec<String> {
    ["false", "f", "0", "no", "n", "off"].map(String::from).to_vec()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagingConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "max_page_size")]
    pub max_page_size: u64,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: max_page_size(),
        }
    }
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn max_page_size() -> u64 {
    MAX_PAGE_SIZE
}

impl PagingConfig {
    /// Clamp a requested page size into `1..=max_page_size`.
    pub fn page_size(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

impl FilterConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: FilterConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(token) = self
            .filters
            .truthy
            .iter()
            .find(|token| self.filters.falsy.iter().any(|f| f.eq_ignore_ascii_case(token)))
        {
            return Err(ConfigError::Invalid {
                message: format!("token '{token}' is listed as both truthy and falsy"),
            });
        }
        if self.filters.ordering_param.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "ordering_param must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn is_truthy(&self, raw: &str) -> bool {
        let raw = raw.trim();
        self.filters.truthy.iter().any(|token| token.eq_ignore_ascii_case(raw))
    }

    pub fn is_falsy(&self, raw: &str) -> bool {
        let raw = raw.trim();
        self.filters.falsy.iter().any(|token| token.eq_ignore_ascii_case(raw))
    }
}
